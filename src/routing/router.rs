//! Per-method dispatch on top of the radix trees.
//!
//! # Data Flow
//! ```text
//! (method, path)
//!     → tree for method → lookup
//!         Matched                      → Resolution::Found
//!         NotFound + trailing slash    → Resolution::Redirect (toggled path)
//!         NotFound + case correction   → Resolution::Redirect (registered spelling)
//!     → other methods match the path  → Resolution::MethodNotAllowed
//!     → Resolution::NotFound
//! ```
//!
//! # Design Decisions
//! - Routes are registered on a [`RouterBuilder`] and frozen by `build()`;
//!   a [`Router`] is never mutated, so it is shared behind an `Arc`
//! - `GET` redirects use 301, every other method 308 so the body and method
//!   are kept by the client
//! - `CONNECT` and `/` are never redirected

use std::collections::HashMap;

use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::routing::error::RouteError;
use crate::routing::lookup::{Lookup, RouteMatch};
use crate::routing::path::clean;
use crate::routing::tree::Tree;

/// Behavior switches for [`Router::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Redirect when the path matches with one trailing `/` added or removed.
    pub redirect_trailing_slash: bool,
    /// Redirect to the cleaned, case-corrected path when it matches.
    pub redirect_fixed_path: bool,
    /// Answer 405 instead of 404 when another method has a route.
    pub handle_method_not_allowed: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            redirect_fixed_path: true,
            handle_method_not_allowed: true,
        }
    }
}

/// Dispatch decision for one request.
#[derive(Debug)]
pub enum Resolution<'a, H> {
    Found(RouteMatch<'a, H>),
    Redirect {
        location: String,
        status: StatusCode,
    },
    MethodNotAllowed {
        /// Methods with a route for the path, sorted by name.
        allowed: Vec<Method>,
    },
    NotFound,
}

impl<H> Resolution<'_, H> {
    /// Short label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Found(_) => "found",
            Resolution::Redirect { .. } => "redirect",
            Resolution::MethodNotAllowed { .. } => "method_not_allowed",
            Resolution::NotFound => "not_found",
        }
    }
}

/// Collects routes before they are frozen into a [`Router`].
#[derive(Debug)]
pub struct RouterBuilder<H> {
    trees: HashMap<Method, Tree<H>>,
    options: RouterOptions,
}

impl<H> Default for RouterBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouterBuilder<H> {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            options: RouterOptions::default(),
        }
    }

    pub fn options(&mut self, options: RouterOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Register `handler` for `method` and `pattern`.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.trees
            .entry(method)
            .or_default()
            .insert(pattern, handler)?;
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn build(self) -> Router<H> {
        Router {
            trees: self.trees,
            options: self.options,
        }
    }
}

/// Frozen routing table, one tree per method.
#[derive(Debug)]
pub struct Router<H> {
    trees: HashMap<Method, Tree<H>>,
    options: RouterOptions,
}

impl<H> Router<H> {
    pub fn builder() -> RouterBuilder<H> {
        RouterBuilder::new()
    }

    pub fn options(&self) -> RouterOptions {
        self.options
    }

    pub fn tree(&self, method: &Method) -> Option<&Tree<H>> {
        self.trees.get(method)
    }

    /// Methods with at least one route, sorted by name.
    pub fn methods(&self) -> Vec<&Method> {
        let mut methods: Vec<&Method> = self.trees.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    pub fn route_count(&self) -> usize {
        self.trees.values().map(Tree::len).sum()
    }

    /// Exact lookup in the tree for `method`.
    pub fn lookup<'a>(&'a self, method: &Method, path: &'a str) -> Lookup<'a, H> {
        match self.trees.get(method) {
            Some(tree) => tree.lookup(path),
            None => Lookup::NotFound {
                trailing_slash_redirect: false,
            },
        }
    }

    /// Methods that have a route matching `path` exactly, sorted by name.
    pub fn allowed(&self, path: &str) -> Vec<Method> {
        self.allowed_except(path, None)
    }

    fn allowed_except(&self, path: &str, skip: Option<&Method>) -> Vec<Method> {
        let mut allowed: Vec<Method> = self
            .trees
            .iter()
            .filter(|(method, _)| Some(*method) != skip)
            .filter(|(_, tree)| tree.lookup(path).is_match())
            .map(|(method, _)| method.clone())
            .collect();
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed
    }

    /// Decide how a request for `method` and `path` is answered.
    pub fn resolve<'a>(&'a self, method: &Method, path: &'a str) -> Resolution<'a, H> {
        if let Some(tree) = self.trees.get(method) {
            match tree.lookup(path) {
                Lookup::Matched(found) => return Resolution::Found(found),
                Lookup::NotFound {
                    trailing_slash_redirect,
                } => {
                    if let Some(redirect) =
                        self.redirect(tree, method, path, trailing_slash_redirect)
                    {
                        return redirect;
                    }
                }
            }
        }

        if self.options.handle_method_not_allowed {
            let allowed = self.allowed_except(path, Some(method));
            if !allowed.is_empty() {
                return Resolution::MethodNotAllowed { allowed };
            }
        }

        Resolution::NotFound
    }

    fn redirect<'a>(
        &self,
        tree: &Tree<H>,
        method: &Method,
        path: &str,
        trailing_slash_redirect: bool,
    ) -> Option<Resolution<'a, H>> {
        if method == Method::CONNECT || path == "/" {
            return None;
        }
        let status = if method == Method::GET {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::PERMANENT_REDIRECT
        };

        if trailing_slash_redirect && self.options.redirect_trailing_slash {
            let location = match path.strip_suffix('/') {
                Some(trimmed) => trimmed.to_string(),
                None => format!("{path}/"),
            };
            return Some(Resolution::Redirect { location, status });
        }

        if self.options.redirect_fixed_path {
            let cleaned = clean(path);
            if let Some(location) =
                tree.find_case_insensitive(&cleaned, self.options.redirect_trailing_slash)
            {
                return Some(Resolution::Redirect { location, status });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(options: RouterOptions) -> Router<&'static str> {
        let mut builder = Router::builder();
        builder
            .options(options)
            .get("/", "index")
            .unwrap()
            .get("/users/:id", "show user")
            .unwrap()
            .get("/docs/", "docs")
            .unwrap()
            .get("/About-Us/", "about")
            .unwrap()
            .post("/users", "create user")
            .unwrap()
            .delete("/users/:id", "delete user")
            .unwrap()
            .put("/items/", "replace items")
            .unwrap();
        builder.build()
    }

    fn redirect<H>(resolution: Resolution<'_, H>) -> (String, StatusCode) {
        match resolution {
            Resolution::Redirect { location, status } => (location, status),
            other => panic!("expected a redirect, got {}", other.outcome()),
        }
    }

    #[test]
    fn test_found_with_params() {
        let r = router(RouterOptions::default());
        match r.resolve(&Method::GET, "/users/42") {
            Resolution::Found(found) => {
                assert_eq!(*found.handler, "show user");
                assert_eq!(found.pattern, "/users/:id");
                assert_eq!(found.params.get("id"), Some("42"));
            }
            other => panic!("unexpected {}", other.outcome()),
        }
    }

    #[test]
    fn test_trailing_slash_redirect_status() {
        let r = router(RouterOptions::default());

        assert_eq!(
            redirect(r.resolve(&Method::GET, "/docs")),
            ("/docs/".to_string(), StatusCode::MOVED_PERMANENTLY)
        );
        assert_eq!(
            redirect(r.resolve(&Method::GET, "/users/42/")),
            ("/users/42".to_string(), StatusCode::MOVED_PERMANENTLY)
        );
        assert_eq!(
            redirect(r.resolve(&Method::PUT, "/items")),
            ("/items/".to_string(), StatusCode::PERMANENT_REDIRECT)
        );
    }

    #[test]
    fn test_fixed_path_redirect() {
        let r = router(RouterOptions::default());

        assert_eq!(
            redirect(r.resolve(&Method::GET, "/about-us")),
            ("/About-Us/".to_string(), StatusCode::MOVED_PERMANENTLY)
        );
        assert_eq!(
            redirect(r.resolve(&Method::GET, "//USERS/../users/7")),
            ("/users/7".to_string(), StatusCode::MOVED_PERMANENTLY)
        );
    }

    #[test]
    fn test_redirects_can_be_disabled() {
        let r = router(RouterOptions {
            redirect_trailing_slash: false,
            redirect_fixed_path: false,
            handle_method_not_allowed: true,
        });

        assert!(matches!(r.resolve(&Method::GET, "/docs"), Resolution::NotFound));
        assert!(matches!(r.resolve(&Method::GET, "/about-us/"), Resolution::NotFound));
    }

    #[test]
    fn test_fixed_path_without_slash_fixing() {
        let r = router(RouterOptions {
            redirect_trailing_slash: false,
            ..RouterOptions::default()
        });

        assert_eq!(
            redirect(r.resolve(&Method::GET, "/ABOUT-US/")).0,
            "/About-Us/"
        );
        assert!(matches!(r.resolve(&Method::GET, "/about-us"), Resolution::NotFound));
    }

    #[test]
    fn test_connect_and_root_never_redirect() {
        let mut builder = Router::builder();
        builder
            .route(Method::CONNECT, "/tunnel/", "tunnel")
            .unwrap()
            .get("/x", "x")
            .unwrap();
        let r = builder.build();

        assert!(matches!(r.resolve(&Method::CONNECT, "/tunnel"), Resolution::NotFound));
        assert!(matches!(r.resolve(&Method::GET, "/"), Resolution::NotFound));
    }

    #[test]
    fn test_method_not_allowed() {
        let r = router(RouterOptions::default());

        match r.resolve(&Method::PATCH, "/users/42") {
            Resolution::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::DELETE, Method::GET]);
            }
            other => panic!("unexpected {}", other.outcome()),
        }
        assert!(matches!(r.resolve(&Method::PATCH, "/nothing"), Resolution::NotFound));
    }

    #[test]
    fn test_method_not_allowed_disabled() {
        let r = router(RouterOptions {
            handle_method_not_allowed: false,
            ..RouterOptions::default()
        });
        assert!(matches!(r.resolve(&Method::PATCH, "/users/42"), Resolution::NotFound));
    }

    #[test]
    fn test_allowed_and_counts() {
        let r = router(RouterOptions::default());

        assert_eq!(r.allowed("/users"), vec![Method::POST]);
        assert_eq!(r.allowed("/users/1"), vec![Method::DELETE, Method::GET]);
        assert!(r.allowed("/missing").is_empty());
        assert_eq!(r.route_count(), 7);
        assert_eq!(
            r.methods(),
            vec![&Method::DELETE, &Method::GET, &Method::POST, &Method::PUT]
        );
        assert_eq!(r.tree(&Method::GET).map(Tree::len), Some(4));
        assert!(r.tree(&Method::PATCH).is_none());
    }

    #[test]
    fn test_registration_errors_propagate() {
        let mut builder: RouterBuilder<()> = Router::builder();
        builder.get("/user/new", ()).unwrap();

        let err = builder.get("/user/:id", ()).unwrap_err();
        assert!(matches!(err, RouteError::RouteConflict { .. }));
        // other methods are independent trees
        assert!(builder.post("/user/:id", ()).is_ok());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: RouterOptions = toml::from_str("redirect_fixed_path = false").unwrap();
        assert!(options.redirect_trailing_slash);
        assert!(!options.redirect_fixed_path);
        assert!(options.handle_method_not_allowed);
    }
}
