//! User endpoints: registration, profiles and subscriptions.

use axum::{
    Json, Router,
    extract::{OriginalUri, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use foodgram_common::{AppError, AppResult};
use foodgram_core::{CreateUserInput, SignupView, SubscriptionView, UserView};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, JsonBody, MaybeAuthUser, PageParams, QueryParams},
    middleware::AppState,
    response::{Page, created, no_content},
};

/// `recipes_limit` query parameter for subscription representations.
#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitParams {
    pub recipes_limit: Option<u64>,
}

/// List users.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(paging): QueryParams<PageParams>,
) -> AppResult<Page<UserView>> {
    let window = paging.window(&state.api);
    let (users, count) = state.user_service.list(window.offset, window.limit).await?;
    let results = state.view_service.users(viewer.viewer_id(), users).await?;

    Page::new(results, count, window, &uri)
}

/// Register a new user.
async fn signup(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateUserInput>,
) -> AppResult<Response> {
    let user = state.user_service.create(input).await?;
    Ok(created(SignupView::from(user)))
}

/// Show the authenticated user.
async fn me(AuthUser(user): AuthUser, State(state): State<AppState>) -> AppResult<Json<UserView>> {
    let viewer_id = user.id.clone();
    Ok(Json(state.view_service.user(Some(viewer_id.as_str()), user).await?))
}

/// Show a user.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserView>> {
    let user = state.user_service.get(&id).await?;
    Ok(Json(state.view_service.user(viewer.viewer_id(), user).await?))
}

/// List the authors the authenticated user follows.
async fn subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(paging): QueryParams<PageParams>,
    QueryParams(params): QueryParams<RecipesLimitParams>,
) -> AppResult<Page<SubscriptionView>> {
    let window = paging.window(&state.api);
    let (results, count) = state
        .subscription_list_service
        .list(&user.id, window.offset, window.limit, params.recipes_limit)
        .await?;

    Page::new(results, count, window, &uri)
}

/// Follow an author.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<RecipesLimitParams>,
) -> AppResult<Response> {
    let author = state.user_service.get(&id).await?;
    state.subscription_service.add(&user.id, &author.id).await?;

    let view = state
        .view_service
        .subscriptions(Some(user.id.as_str()), vec![author], params.recipes_limit)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("subscription view missing".to_string()))?;
    Ok(created(view))
}

/// Unfollow an author.
async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let author = state.user_service.get(&id).await?;
    state.subscription_service.remove(&user.id, &author.id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list).post(signup))
        .route("/users/me/", get(me))
        .route("/users/subscriptions/", get(subscriptions))
        .route("/users/{id}/", get(show))
        .route(
            "/users/{id}/subscribe/",
            post(subscribe).delete(unsubscribe),
        )
}
