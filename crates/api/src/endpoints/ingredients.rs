//! Ingredient endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use foodgram_common::AppResult;
use foodgram_db::entities::ingredient;
use serde::Deserialize;

use crate::{extractors::QueryParams, middleware::AppState};

/// Ingredient search parameters. `name` is accepted as an alias of `search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub name: Option<String>,
}

/// List ingredients whose name starts with the given prefix.
async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> AppResult<Json<Vec<ingredient::Model>>> {
    let prefix = params.search.or(params.name);
    Ok(Json(state.ingredient_service.search(prefix.as_deref()).await?))
}

/// Show an ingredient.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ingredient::Model>> {
    Ok(Json(state.ingredient_service.get(&id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list))
        .route("/ingredients/{id}/", get(show))
}
