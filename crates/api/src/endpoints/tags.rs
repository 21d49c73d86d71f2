//! Tag endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use foodgram_common::AppResult;
use foodgram_db::entities::tag;

use crate::middleware::AppState;

/// List all tags (unpaginated).
async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<tag::Model>>> {
    Ok(Json(state.tag_service.list().await?))
}

/// Show a tag.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<tag::Model>> {
    Ok(Json(state.tag_service.get(&id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(list))
        .route("/tags/{id}/", get(show))
}
