//! HTTP API layer for foodgram.
//!
//! - **Endpoints**: recipes, tags, ingredients, users, token auth
//! - **Extractors**: authentication, pagination
//! - **Middleware**: token authentication and shared state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware as axum_middleware};

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// The API mounted under `/api` with token authentication applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
