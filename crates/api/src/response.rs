//! API response types.

use axum::{
    Json,
    http::{
        StatusCode, Uri,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use foodgram_common::{AppError, AppResult};
use serde::Serialize;

use crate::extractors::PageWindow;

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Page<T> {
    /// Build the envelope for `results` at `window`. Links reuse the request
    /// URI with only `page` replaced.
    pub fn new(results: Vec<T>, count: u64, window: PageWindow, uri: &Uri) -> AppResult<Self> {
        if window.page > 1 && window.offset >= count {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }

        let next = (window.offset + window.limit < count).then(|| page_link(uri, window.page + 1));
        let previous = (window.page > 1).then(|| page_link(uri, window.page - 1));

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

fn page_link(uri: &Uri, page: u64) -> String {
    let mut params: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty() && *p != "page" && !p.starts_with("page="))
        .collect();
    let page = format!("page={page}");
    params.push(&page);

    format!("{}?{}", uri.path(), params.join("&"))
}

/// 201 with a JSON body.
pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// Empty success response.
#[must_use]
pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Plain-text file download.
pub fn text_attachment(filename: &str, body: String) -> Response {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
