//! Responses for requests that do not reach an endpoint.
//!
//! # Responsibilities
//! - Redirects to the corrected path, keeping the query string
//! - 405 with an `Allow` header listing the methods that would match
//! - Plain 404
//! - 500 for endpoints that panicked

use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};

/// Redirect to `location`, carrying over the request's query string.
pub fn redirect(status: StatusCode, location: &str, query: Option<&str>) -> Response {
    let target = match query {
        Some(query) if !query.is_empty() => format!("{location}?{query}"),
        _ => location.to_string(),
    };

    match HeaderValue::from_str(&target) {
        Ok(value) => Response::builder()
            .status(status)
            .header(header::LOCATION, value)
            .body(Body::empty())
            .unwrap_or_else(|_| internal_error()),
        Err(_) => {
            tracing::warn!(location = %target, "Redirect target is not a valid header value");
            not_found()
        }
    }
}

pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        "Method Not Allowed",
    )
        .into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Answer for a request whose endpoint panicked. The panic message is logged,
/// never sent to the client.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %message, "Endpoint panicked");
    internal_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_keeps_query() {
        let response = redirect(StatusCode::MOVED_PERMANENTLY, "/docs/", Some("page=2"));
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/docs/?page=2");

        let response = redirect(StatusCode::PERMANENT_REDIRECT, "/docs", Some(""));
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/docs");
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = method_not_allowed(&[Method::DELETE, Method::GET]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "DELETE, GET");
    }

    #[test]
    fn test_panic_response_for_any_payload() {
        let response = panic_response(Box::new(String::from("secret detail")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
