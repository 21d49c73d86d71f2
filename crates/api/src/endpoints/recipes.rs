//! Recipe endpoints, including the favorite and shopping cart toggles.

use axum::{
    Json, Router,
    extract::{OriginalUri, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use foodgram_common::AppResult;
use foodgram_core::{
    CreateRecipeInput, RecipeView, ShortRecipeView, UpdateRecipeInput,
    services::shopping_list::SHOPPING_LIST_FILENAME,
};
use foodgram_db::repositories::RecipeFilter;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, JsonBody, MaybeAuthUser, PageParams, QueryParams},
    middleware::AppState,
    response::{Page, created, no_content, text_attachment},
};

/// Recipe list filters.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "True"))
}

impl RecipeListParams {
    /// Viewer-relative filters are dropped for anonymous requests.
    fn into_filter(self, viewer_id: Option<&str>) -> RecipeFilter {
        let favorited = is_truthy(self.is_favorited.as_deref());
        let in_cart = is_truthy(self.is_in_shopping_cart.as_deref());

        RecipeFilter {
            author_id: self.author,
            tag_slugs: self.tags,
            favorited_by: viewer_id.filter(|_| favorited).map(ToString::to_string),
            in_cart_of: viewer_id.filter(|_| in_cart).map(ToString::to_string),
        }
    }
}

/// List recipes, newest first.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(paging): QueryParams<PageParams>,
    QueryParams(params): QueryParams<RecipeListParams>,
) -> AppResult<Page<RecipeView>> {
    let window = paging.window(&state.api);
    let filter = params.into_filter(viewer.viewer_id());

    let (recipes, count) = state
        .recipe_service
        .list(&filter, window.offset, window.limit)
        .await?;
    let results = state.view_service.recipes(viewer.viewer_id(), recipes).await?;

    Page::new(results, count, window, &uri)
}

/// Show a recipe.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecipeView>> {
    let recipe = state.recipe_service.get(&id).await?;
    Ok(Json(state.view_service.recipe(viewer.viewer_id(), recipe).await?))
}

/// Create a recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateRecipeInput>,
) -> AppResult<Response> {
    let recipe = state.recipe_service.create(&user, input).await?;
    let view = state.view_service.recipe(Some(user.id.as_str()), recipe).await?;
    Ok(created(view))
}

/// Partially update a recipe.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateRecipeInput>,
) -> AppResult<Json<RecipeView>> {
    let recipe = state.recipe_service.update(Some(&user), &id, input).await?;
    Ok(Json(state.view_service.recipe(Some(user.id.as_str()), recipe).await?))
}

/// Delete a recipe.
async fn destroy(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.recipe_service.delete(Some(&user), &id).await?;
    Ok(no_content())
}

/// Add a recipe to favorites.
async fn add_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let recipe = state.recipe_service.get(&id).await?;
    state.favorite_service.add(&user.id, &recipe.id).await?;
    Ok(created(ShortRecipeView::from(recipe)))
}

/// Remove a recipe from favorites.
async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let recipe = state.recipe_service.get(&id).await?;
    state.favorite_service.remove(&user.id, &recipe.id).await?;
    Ok(no_content())
}

/// Add a recipe to the shopping cart.
async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let recipe = state.recipe_service.get(&id).await?;
    state.shopping_cart_service.add(&user.id, &recipe.id).await?;
    Ok(created(ShortRecipeView::from(recipe)))
}

/// Remove a recipe from the shopping cart.
async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let recipe = state.recipe_service.get(&id).await?;
    state.shopping_cart_service.remove(&user.id, &recipe.id).await?;
    Ok(no_content())
}

/// Download the aggregated shopping list as a text file.
async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let body = state.shopping_list_service.render_for(&user.id).await?;
    Ok(text_attachment(SHOPPING_LIST_FILENAME, body))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list).post(create))
        .route(
            "/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route("/recipes/{id}/", get(show).patch(update).delete(destroy))
        .route(
            "/recipes/{id}/favorite/",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_filters_ignored_for_anonymous() {
        let params = RecipeListParams {
            is_favorited: Some("1".to_string()),
            is_in_shopping_cart: Some("true".to_string()),
            ..Default::default()
        };
        let filter = params.into_filter(None);
        assert!(filter.favorited_by.is_none());
        assert!(filter.in_cart_of.is_none());
    }

    #[test]
    fn test_viewer_filters_applied_for_user() {
        let params = RecipeListParams {
            is_favorited: Some("1".to_string()),
            is_in_shopping_cart: Some("0".to_string()),
            tags: vec!["lunch".to_string()],
            ..Default::default()
        };
        let filter = params.into_filter(Some("user1"));
        assert_eq!(filter.favorited_by.as_deref(), Some("user1"));
        assert!(filter.in_cart_of.is_none());
        assert_eq!(filter.tag_slugs, vec!["lunch"]);
    }
}
