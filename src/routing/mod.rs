//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup or reload):
//!     (method, pattern, handler)[]
//!     → tree.rs (validate, split prefixes, reject conflicts)
//!     → router.rs (one tree per method, frozen by build())
//!
//! Incoming Request (method, path):
//!     → lookup.rs (walk the tree, capture params)
//!     → on miss: path.rs (clean) → fixed_path.rs (case-insensitive walk)
//!     → Return: Resolution (found / redirect / 405 / 404)
//! ```
//!
//! # Design Decisions
//! - Trees are compiled once and immutable at runtime
//! - No regex and no backtracking in the primary matcher
//! - Deterministic: a path matches at most one route per method
//! - Parameters are returned to the caller, never stored globally

pub mod error;
pub mod fixed_path;
pub mod lookup;
pub mod params;
pub mod path;
pub mod router;
pub mod tree;

pub use error::RouteError;
pub use lookup::{Lookup, RouteMatch};
pub use params::{Param, Params, PathParams};
pub use path::clean;
pub use router::{Resolution, Router, RouterBuilder, RouterOptions};
pub use tree::Tree;
