//! Route table compilation.
//!
//! Turns the `[[routes]]` of a configuration into a frozen [`Router`] whose
//! handlers are shared [`RouteTarget`]s.

use std::sync::Arc;

use axum::http::Method;
use serde_json::{json, Map, Value};

use crate::config::loader::ConfigError;
use crate::config::schema::RouterConfig;
use crate::config::validation::ValidationError;
use crate::http::endpoint::{Endpoint, RouteTarget};
use crate::routing::{Resolution, Router};

/// The routing table served by the HTTP layer.
pub type RouteTable = Router<Arc<RouteTarget>>;

/// Register every configured route, in file order.
///
/// Fails on the first route the trees reject, naming that route.
pub fn build_route_table(config: &RouterConfig) -> Result<RouteTable, ConfigError> {
    let mut builder = Router::builder();
    builder.options(config.router);

    for route in &config.routes {
        let method = Method::from_bytes(route.method.as_bytes()).map_err(|_| {
            ConfigError::Validation(vec![ValidationError {
                field: format!("routes.{}.method", route.name),
                message: format!("'{}' is not an HTTP method", route.method),
            }])
        })?;

        let endpoint = Endpoint::from_config(&route.endpoint).map_err(|e| {
            ConfigError::Validation(vec![ValidationError {
                field: format!("routes.{}.endpoint.status", route.name),
                message: e.to_string(),
            }])
        })?;
        let target = Arc::new(RouteTarget {
            name: route.name.clone(),
            pattern: route.pattern.clone(),
            endpoint,
        });

        builder
            .route(method.clone(), &route.pattern, target)
            .map_err(|source| ConfigError::Route {
                name: route.name.clone(),
                source,
            })?;

        tracing::debug!(
            route = %route.name,
            method = %method,
            pattern = %route.pattern,
            "Route registered"
        );
    }

    Ok(builder.build())
}

/// JSON view of a dispatch decision, as printed by `trie-router lookup`.
pub fn describe(resolution: &Resolution<'_, Arc<RouteTarget>>) -> Value {
    match resolution {
        Resolution::Found(found) => {
            let params: Map<String, Value> = found
                .params
                .iter()
                .map(|p| (p.key.to_string(), Value::from(p.value)))
                .collect();
            json!({
                "outcome": resolution.outcome(),
                "route": found.handler.name,
                "pattern": found.pattern,
                "endpoint": found.handler.endpoint.kind(),
                "params": params,
            })
        }
        Resolution::Redirect { location, status } => json!({
            "outcome": resolution.outcome(),
            "location": location,
            "status": status.as_u16(),
        }),
        Resolution::MethodNotAllowed { allowed } => json!({
            "outcome": resolution.outcome(),
            "allowed": allowed.iter().map(Method::as_str).collect::<Vec<_>>(),
        }),
        Resolution::NotFound => json!({ "outcome": resolution.outcome() }),
    }
}
