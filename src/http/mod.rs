//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout)
//!     → dispatch handler: RouteTable::resolve(method, path)
//!         Found            → endpoint.rs (echo / text / files)
//!         Redirect         → response.rs (301/308 + Location)
//!         MethodNotAllowed → response.rs (405 + Allow)
//!         NotFound         → response.rs (404)
//!     → Send to client
//! ```

pub mod endpoint;
pub mod request;
pub mod response;
pub mod server;
pub mod table;

pub use endpoint::{Endpoint, RouteTarget};
pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
pub use table::{build_route_table, describe, RouteTable};
