//! Radix tree HTTP request router.
//!
//! The `routing` module is the engine: per-method trees, lookup with
//! parameter capture, case-insensitive correction and path cleaning. The
//! other modules serve a TOML-configured route table over HTTP.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Lookup, Resolution, RouteError, Router, RouterBuilder, Tree};
