//! Token authentication endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use foodgram_common::AppResult;
use foodgram_core::LoginInput;
use serde::Serialize;

use crate::{
    extractors::{AuthUser, JsonBody},
    middleware::AppState,
    response::no_content,
};

/// Login response.
#[derive(Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Exchange email and password for an access token.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginInput>,
) -> AppResult<Json<TokenResponse>> {
    let auth_token = state.user_service.login(&req).await?;
    Ok(Json(TokenResponse { auth_token }))
}

/// Invalidate the caller's access token.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.user_service.logout(&user.id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token/login/", post(login))
        .route("/auth/token/logout/", post(logout))
}
