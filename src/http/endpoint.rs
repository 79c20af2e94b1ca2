//! Endpoints a route can answer with.
//!
//! # Responsibilities
//! - `echo`: describe the match as JSON
//! - `text`: fixed body and status
//! - `files`: serve a file addressed by the `*filepath` parameter
//!
//! # Design Decisions
//! - Endpoints read path parameters from the request's extensions
//! - File paths are cleaned before they reach `ServeDir`

use std::path::Path;

use axum::{
    body::Body,
    http::{status::InvalidStatusCode, Request, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::config::schema::EndpointConfig;
use crate::http::request::RequestIdExt;
use crate::routing::{clean, PathParams};

/// Name of the catch-all parameter used by file routes.
pub const FILEPATH_PARAM: &str = "filepath";

/// What a matched route answers with, ready to serve.
#[derive(Debug, Clone)]
pub enum Endpoint {
    Echo,
    Text { body: String, status: StatusCode },
    Files(ServeDir),
}

impl Endpoint {
    pub fn from_config(config: &EndpointConfig) -> Result<Self, InvalidStatusCode> {
        let endpoint = match config {
            EndpointConfig::Echo => Endpoint::Echo,
            EndpointConfig::Text { body, status } => Endpoint::Text {
                body: body.clone(),
                status: StatusCode::from_u16(*status)?,
            },
            EndpointConfig::Files { root } => Endpoint::Files(serve_dir(root)),
        };
        Ok(endpoint)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Endpoint::Echo => "echo",
            Endpoint::Text { .. } => "text",
            Endpoint::Files(_) => "files",
        }
    }
}

fn serve_dir(root: &Path) -> ServeDir {
    ServeDir::new(root).append_index_html_on_directories(true)
}

/// A registered route: its identity plus the endpoint it runs.
#[derive(Debug, Clone)]
pub struct RouteTarget {
    pub name: String,
    pub pattern: String,
    pub endpoint: Endpoint,
}

impl RouteTarget {
    /// Answer a request that matched this route. [`PathParams`] are expected
    /// in the request's extensions.
    pub async fn respond(&self, request: Request<Body>) -> Response {
        match &self.endpoint {
            Endpoint::Echo => self.echo(&request).into_response(),
            Endpoint::Text { body, status } => (*status, body.clone()).into_response(),
            Endpoint::Files(dir) => serve_file(dir.clone(), request).await,
        }
    }

    fn echo(&self, request: &Request<Body>) -> Json<Value> {
        let params: Map<String, Value> = request
            .extensions()
            .get::<PathParams>()
            .map(|params| {
                params
                    .iter()
                    .map(|(key, value)| (key.to_string(), Value::from(value)))
                    .collect()
            })
            .unwrap_or_default();

        Json(json!({
            "route": self.name,
            "pattern": self.pattern,
            "method": request.method().as_str(),
            "path": request.uri().path(),
            "params": params,
            "request_id": request.request_id(),
        }))
    }
}

/// Rewrite the request path to the captured file path and hand it to
/// `ServeDir`.
async fn serve_file(dir: ServeDir, request: Request<Body>) -> Response {
    let filepath = request
        .extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(FILEPATH_PARAM))
        .unwrap_or("/");
    let cleaned = clean(filepath);

    let target = match request.uri().query() {
        Some(query) => format!("{cleaned}?{query}"),
        None => cleaned.into_owned(),
    };
    let uri = match target.parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::debug!(path = %target, error = %e, "Rejecting unparseable file path");
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = uri;
    let request = Request::from_parts(parts, body);

    match dir.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(infallible) => match infallible {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::path::PathBuf;

    fn target(endpoint: Endpoint) -> RouteTarget {
        RouteTarget {
            name: "test".to_string(),
            pattern: "/files/*filepath".to_string(),
            endpoint,
        }
    }

    fn request(path: &str, params: &[(&str, &str)]) -> Request<Body> {
        let mut request = Request::builder()
            .uri(path)
            .header("x-request-id", "req-1")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(path_params(params));
        request
    }

    fn path_params(pairs: &[(&str, &str)]) -> PathParams {
        if pairs.is_empty() {
            return PathParams::default();
        }
        let pattern: String = pairs.iter().map(|(k, _)| format!("/:{k}")).collect();
        let path: String = pairs.iter().map(|(_, v)| format!("/{v}")).collect();
        let mut tree = crate::routing::Tree::new();
        tree.insert(&pattern, ()).unwrap();
        tree.lookup(&path).into_match().unwrap().params.to_owned_params()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_from_config() {
        let text = Endpoint::from_config(&EndpointConfig::Text {
            body: "hi".to_string(),
            status: 201,
        })
        .unwrap();
        assert!(matches!(
            text,
            Endpoint::Text { ref body, status } if body == "hi" && status == StatusCode::CREATED
        ));
        assert_eq!(Endpoint::from_config(&EndpointConfig::Echo).unwrap().kind(), "echo");
        assert_eq!(
            Endpoint::from_config(&EndpointConfig::Files {
                root: PathBuf::from(".")
            })
            .unwrap()
            .kind(),
            "files"
        );
    }

    #[test]
    fn test_from_config_rejects_bad_status() {
        let result = Endpoint::from_config(&EndpointConfig::Text {
            body: "hi".to_string(),
            status: 42,
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_echo_describes_match() {
        let route = target(Endpoint::Echo);
        let response = route
            .respond(request("/users/7/posts/9", &[("id", "7"), ("post", "9")]))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["route"], "test");
        assert_eq!(body["method"], "GET");
        assert_eq!(body["path"], "/users/7/posts/9");
        assert_eq!(body["params"]["id"], "7");
        assert_eq!(body["params"]["post"], "9");
        assert_eq!(body["request_id"], "req-1");

        let keys: Vec<&str> = body["params"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["id", "post"]);
    }

    #[tokio::test]
    async fn test_text_endpoint() {
        let route = target(Endpoint::Text {
            body: "short and stout".to_string(),
            status: StatusCode::IM_A_TEAPOT,
        });
        let response = route.respond(request("/tea", &[])).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_string(response).await, "short and stout");
    }
}
