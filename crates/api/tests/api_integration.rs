//! API integration tests.
//!
//! These tests drive the full router over a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use foodgram_api::{AppState, app};
use foodgram_common::config::ApiConfig;
use foodgram_db::entities::{
    ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, user,
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value as DbValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "0123456789abcdef0123456789abcdef";

/// Build the application over a prepared mock database.
fn create_test_app(db: MockDatabase) -> Router {
    let db = Arc::new(db.into_connection());
    app(AppState::new(db, ApiConfig::default()))
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn user(id: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        email: format!("{id}@example.com"),
        first_name: "Ivan".to_string(),
        last_name: "Petrov".to_string(),
        password: String::new(),
        token: Some(TOKEN.to_string()),
        is_admin: false,
        created_at: Utc::now().into(),
    }
}

fn recipe(id: &str, author_id: &str) -> recipe::Model {
    recipe::Model {
        id: id.to_string(),
        author_id: author_id.to_string(),
        name: "Borscht".to_string(),
        text: "Boil the beets".to_string(),
        cooking_time: 90,
        image: "data:image/png;base64,AAAA".to_string(),
        created_at: Utc::now().into(),
    }
}

fn tag_row(recipe_id: &str) -> (recipe_tag::Model, tag::Model) {
    (
        recipe_tag::Model {
            id: "rt1".to_string(),
            recipe_id: recipe_id.to_string(),
            tag_id: "tag1".to_string(),
        },
        tag::Model {
            id: "tag1".to_string(),
            name: "Обед".to_string(),
            color: "#008000".to_string(),
            slug: "lunch".to_string(),
        },
    )
}

fn ingredient_row(recipe_id: &str) -> (recipe_ingredient::Model, ingredient::Model) {
    (
        recipe_ingredient::Model {
            id: "ri1".to_string(),
            recipe_id: recipe_id.to_string(),
            ingredient_id: "ing1".to_string(),
            amount: 300,
        },
        ingredient::Model {
            id: "ing1".to_string(),
            name: "Beetroot".to_string(),
            measurement_unit: "g".to_string(),
        },
    )
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_anonymous_recipe_create_is_unauthorized() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(request("POST", "/api/recipes/", None, Some("{}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(request("GET", "/api/nonexistent/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_create_with_empty_lists_returns_field_errors() {
    let app = create_test_app(empty_db().append_query_results([[user("cook")]]));

    let body = r#"{"ingredients": [], "tags": [], "image": "data:image/png;base64,AAAA",
        "name": "Borscht", "text": "Boil the beets", "cooking_time": 90}"#;
    let response = app
        .oneshot(request("POST", "/api/recipes/", Some(TOKEN), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["ingredients"].is_array());
    assert!(json["tags"].is_array());
}

#[tokio::test]
async fn test_anonymous_recipe_detail_has_false_flags() {
    let db = empty_db()
        .append_query_results([[recipe("recipe1", "cook")]])
        .append_query_results([[tag_row("recipe1")]])
        .append_query_results([[ingredient_row("recipe1")]])
        .append_query_results([[user("cook")]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("GET", "/api/recipes/recipe1/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["is_favorited"], false);
    assert_eq!(json["is_in_shopping_cart"], false);
    assert_eq!(json["author"]["is_subscribed"], false);
    assert_eq!(json["tags"][0]["slug"], "lunch");
    assert_eq!(json["ingredients"][0]["amount"], 300);
    assert_eq!(json["ingredients"][0]["measurement_unit"], "g");
}

#[tokio::test]
async fn test_missing_recipe_returns_404() {
    let db = empty_db().append_query_results([Vec::<recipe::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("GET", "/api/recipes/missing/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscribe_to_self_is_rejected() {
    let db = empty_db()
        .append_query_results([[user("cook")]])
        .append_query_results([[user("cook")]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("POST", "/api/users/cook/subscribe/", Some(TOKEN), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "You can't subscribe to yourself");
}

#[tokio::test]
async fn test_unfavorite_missing_favorite_is_rejected() {
    let db = empty_db()
        .append_query_results([[user("cook")]])
        .append_query_results([[recipe("recipe1", "chef")]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("DELETE", "/api/recipes/recipe1/favorite/", Some(TOKEN), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "This recipe is not in your favorite list");
}

#[tokio::test]
async fn test_remove_from_cart_returns_no_content() {
    let db = empty_db()
        .append_query_results([[user("cook")]])
        .append_query_results([[recipe("recipe1", "chef")]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("DELETE", "/api/recipes/recipe1/shopping_cart/", Some(TOKEN), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_download_empty_cart_returns_attachment() {
    let db = empty_db()
        .append_query_results([[user("cook")]])
        .append_query_results([Vec::<shopping_cart::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(TOKEN),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("shopping_cart.txt"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.ends_with("Продуктовый помощник Foodgram"));
}

#[tokio::test]
async fn test_unknown_token_is_treated_as_anonymous() {
    let db = empty_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("GET", "/api/users/me/", Some("stale"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_unknown_email_is_rejected() {
    let db = empty_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_app(db);

    let body = r#"{"email": "nobody@example.com", "password": "secret-password"}"#;
    let response = app
        .oneshot(request("POST", "/api/auth/token/login/", None, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Unable to log in with provided credentials.");
}

#[tokio::test]
async fn test_tags_list_is_unpaginated() {
    let db = empty_db().append_query_results([[tag_row("recipe1").1]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request("GET", "/api/tags/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["color"], "#008000");
}

#[tokio::test]
async fn test_recipe_create_with_missing_fields_returns_field_errors() {
    let app = create_test_app(empty_db().append_query_results([[user("cook")]]));

    let response = app
        .oneshot(request("POST", "/api/recipes/", Some(TOKEN), Some("{}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json.as_object().unwrap().values().all(Value::is_array));
}

#[tokio::test]
async fn test_recipe_create_with_wrongly_typed_field_is_bad_request() {
    let app = create_test_app(empty_db().append_query_results([[user("cook")]]));

    let body = r#"{"ingredients": [{"id": "ing1", "amount": 1}], "tags": ["tag1"],
        "image": "data:image/png;base64,AAAA", "name": "Borscht", "text": "Boil",
        "cooking_time": "abc"}"#;
    let response = app
        .oneshot(request("POST", "/api/recipes/", Some(TOKEN), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_signup_without_password_names_the_field() {
    let app = create_test_app(empty_db());

    let body = r#"{"email": "cook@example.com", "username": "cook"}"#;
    let response = app
        .oneshot(request("POST", "/api/users/", None, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["password"].is_array());
}

#[tokio::test]
async fn test_unparsable_page_is_bad_request() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(request("GET", "/api/recipes/?page=abc", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_page_far_past_the_end_is_not_found() {
    let count = BTreeMap::from([("num_items", DbValue::BigInt(Some(3)))]);
    let db = empty_db()
        .append_query_results([Vec::<user::Model>::new()])
        .append_query_results([[count]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(request(
            "GET",
            "/api/users/?page=18446744073709551615",
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Invalid page.");
}
