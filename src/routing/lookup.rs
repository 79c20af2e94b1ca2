//! Path matching against a built tree.
//!
//! # Responsibilities
//! - Resolve a request path to at most one handler
//! - Capture `:name` and `*name` values without copying them
//! - Report when toggling a trailing slash would have matched
//!
//! # Design Decisions
//! - Matching is case-sensitive and byte-wise
//! - Parameter storage is sized from the root's `max_params` on first use
//! - A miss is a value (`Lookup::NotFound`), never an error

use crate::routing::params::Params;
use crate::routing::tree::{Node, NodeKind, Tree};

/// A successful match.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    /// The pattern the handler was registered with.
    pub pattern: &'a str,
    pub params: Params<'a>,
}

/// Outcome of [`Tree::lookup`].
#[derive(Debug)]
pub enum Lookup<'a, H> {
    Matched(RouteMatch<'a, H>),
    NotFound {
        /// Adding or removing one trailing `/` would reach a handler.
        trailing_slash_redirect: bool,
    },
}

impl<'a, H> Lookup<'a, H> {
    pub fn is_match(&self) -> bool {
        matches!(self, Lookup::Matched(_))
    }

    pub fn into_match(self) -> Option<RouteMatch<'a, H>> {
        match self {
            Lookup::Matched(found) => Some(found),
            Lookup::NotFound { .. } => None,
        }
    }

    pub fn trailing_slash_redirect(&self) -> bool {
        matches!(
            self,
            Lookup::NotFound {
                trailing_slash_redirect: true
            }
        )
    }
}

fn not_found<'a, H>(trailing_slash_redirect: bool) -> Lookup<'a, H> {
    Lookup::NotFound {
        trailing_slash_redirect,
    }
}

fn matched<'a, H>(node: &'a Node<H>, params: Params<'a>) -> Lookup<'a, H> {
    match &node.leaf {
        Some(leaf) => Lookup::Matched(RouteMatch {
            handler: &leaf.handler,
            pattern: &leaf.pattern,
            params,
        }),
        None => not_found(false),
    }
}

impl<H> Tree<H> {
    /// Find the handler registered for `path`.
    pub fn lookup<'a>(&'a self, path: &'a str) -> Lookup<'a, H> {
        let capacity = self.root.max_params;
        let bytes = path.as_bytes();
        let mut node = &self.root;
        let mut consumed = 0;
        let mut params = Params::new();
        // whether the path up to the current node has a handler
        let mut parent_leaf = false;

        loop {
            let rest = &bytes[consumed..];

            match &node.kind {
                NodeKind::Static => {
                    let segment = node.segment.as_slice();

                    if rest.len() > segment.len() && rest.starts_with(segment) {
                        consumed += segment.len();
                        let rest = &bytes[consumed..];
                        parent_leaf = node.leaf.is_some();

                        if node.wild_child {
                            node = &node.children[0];
                            continue;
                        }
                        if let Some(i) = node.child_position(rest[0]) {
                            node = &node.children[i];
                            continue;
                        }
                        return not_found(rest == b"/" && node.leaf.is_some());
                    }

                    if rest == segment {
                        if node.leaf.is_some() {
                            return matched(node, params);
                        }
                        let tsr = node.trailing_slash_route() || (segment == b"/" && parent_leaf);
                        return not_found(tsr);
                    }

                    // the path is shorter than, or diverges from, this segment
                    let tsr = (rest == b"/" && parent_leaf)
                        || (segment.len() == rest.len() + 1
                            && segment[rest.len()] == b'/'
                            && segment.starts_with(rest)
                            && node.leaf.is_some());
                    return not_found(tsr);
                }

                NodeKind::Param { name } => {
                    let end = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
                    if end == 0 {
                        return not_found(rest == b"/" && parent_leaf);
                    }
                    let Some(value) = path.get(consumed..consumed + end) else {
                        return not_found(false);
                    };
                    params.push(name, value, capacity);
                    consumed += end;

                    if end < rest.len() {
                        if let Some(child) = node.children.first() {
                            parent_leaf = node.leaf.is_some();
                            node = child;
                            continue;
                        }
                        return not_found(rest.len() == end + 1 && node.leaf.is_some());
                    }

                    if node.leaf.is_some() {
                        return matched(node, params);
                    }
                    return not_found(node.trailing_slash_route());
                }

                NodeKind::CatchAll { name } => {
                    if rest.first() != Some(&b'/') {
                        return not_found(false);
                    }
                    let Some(value) = path.get(consumed..) else {
                        return not_found(false);
                    };
                    params.push(name, value, capacity);
                    return matched(node, params);
                }
            }
        }
    }
}
