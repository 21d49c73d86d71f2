//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use foodgram_common::config::ApiConfig;
use foodgram_core::{
    FavoriteService, IngredientService, RecipeService, ShoppingCartService, ShoppingListService,
    SubscriptionListService, SubscriptionService, TagService, UserService, ViewService,
};
use foodgram_db::repositories::{
    FavoriteRepository, IngredientRepository, RecipeRepository, ShoppingCartRepository,
    SubscriptionRepository, TagRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub tag_service: TagService,
    pub ingredient_service: IngredientService,
    pub recipe_service: RecipeService,
    pub favorite_service: FavoriteService,
    pub shopping_cart_service: ShoppingCartService,
    pub subscription_service: SubscriptionService,
    pub subscription_list_service: SubscriptionListService,
    pub shopping_list_service: ShoppingListService,
    pub view_service: ViewService,
    pub api: ApiConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, api: ApiConfig) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let tag_repo = TagRepository::new(Arc::clone(&db));
        let ingredient_repo = IngredientRepository::new(Arc::clone(&db));
        let recipe_repo = RecipeRepository::new(Arc::clone(&db));
        let favorite_repo = FavoriteRepository::new(Arc::clone(&db));
        let cart_repo = ShoppingCartRepository::new(Arc::clone(&db));
        let subscription_repo = SubscriptionRepository::new(db);

        let view_service = ViewService::new(
            user_repo.clone(),
            recipe_repo.clone(),
            favorite_repo.clone(),
            cart_repo.clone(),
            subscription_repo.clone(),
        );

        Self {
            user_service: UserService::new(user_repo.clone()),
            tag_service: TagService::new(tag_repo.clone()),
            ingredient_service: IngredientService::new(ingredient_repo.clone()),
            recipe_service: RecipeService::new(recipe_repo.clone(), tag_repo, ingredient_repo),
            favorite_service: FavoriteService::new(favorite_repo),
            shopping_cart_service: ShoppingCartService::new(cart_repo.clone()),
            subscription_service: SubscriptionService::new(subscription_repo.clone()),
            subscription_list_service: SubscriptionListService::new(
                subscription_repo,
                user_repo,
                view_service.clone(),
            ),
            shopping_list_service: ShoppingListService::new(cart_repo, recipe_repo),
            view_service,
            api,
        }
    }
}

/// Extract the token from `Authorization: Token <t>` or `Authorization: Bearer <t>`.
fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware.
///
/// Unknown tokens leave the request anonymous; endpoints that need a user
/// reject it themselves.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_header)
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown access token"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
