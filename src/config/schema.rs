//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router
//! service. All types derive Serde traits for deserialization from TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;
use crate::http::table::{build_route_table, RouteTable};
use crate::routing::RouterOptions;

/// Root configuration for the router service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Redirect and 405 behavior of the dispatcher.
    pub router: RouterOptions,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions, registered in file order.
    pub routes: Vec<RouteConfig>,
}

impl RouterConfig {
    /// Build the frozen route table described by this configuration.
    pub fn compile(&self) -> Result<RouteTable, ConfigError> {
        build_route_table(self)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// A single route: method and pattern mapped to an endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// HTTP method (e.g., "GET").
    #[serde(default = "default_method")]
    pub method: String,

    /// Path pattern with optional `:name` and trailing `*name` segments.
    pub pattern: String,

    pub endpoint: EndpointConfig,
}

fn default_method() -> String {
    "GET".to_string()
}

/// What a matched route answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointConfig {
    /// JSON description of the match (route, params, request id).
    Echo,

    /// Fixed body and status.
    Text {
        body: String,
        #[serde(default = "default_status")]
        status: u16,
    },

    /// Files below `root`, addressed by the `*filepath` parameter.
    Files { root: PathBuf },
}

fn default_status() -> u16 {
    200
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
