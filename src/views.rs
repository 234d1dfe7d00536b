//! Page contexts handed to the template layer, serialized as JSON.

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::flash::{self, Flash};

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub title: &'static str,
    pub messages: Vec<Flash>,
    #[serde(flatten)]
    pub data: T,
}

/// Data for pages that carry nothing but title and messages.
#[derive(Debug, Default, Serialize)]
pub struct Blank {}

impl<T: Serialize> Page<T> {
    /// Build a page, draining the session's pending flash messages into it.
    pub async fn render(session: &Session, title: &'static str, data: T) -> Result<Self, AppError> {
        let messages = flash::take(session).await?;
        Ok(Self {
            title,
            messages,
            data,
        })
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `302 Found` to `to`.
pub fn redirect(to: &str) -> Response {
    match HeaderValue::try_from(to) {
        Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
        Err(_) => (StatusCode::FOUND, [(LOCATION, HeaderValue::from_static("/"))]).into_response(),
    }
}

/// A `next` target is followed only when it stays on this site.
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target
            .chars()
            .any(|c| c == '\\' || c.is_ascii_control() || c.is_whitespace())
}
