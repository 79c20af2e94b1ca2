//! Radix tree nodes and route insertion.
//!
//! # Responsibilities
//! - Validate route patterns before they touch the tree
//! - Split compressed edges when a new pattern diverges mid-segment
//! - Reject patterns that would make a request path ambiguous
//! - Keep children ordered by priority for faster average lookups
//!
//! # Design Decisions
//! - A node owns its children (`Vec`), no parent pointers
//! - Static children are indexed by their first byte in `indices`
//! - A wildcard child (param or catch-all) is always the only child
//! - Priorities and `max_params` are only updated once an insertion succeeds

use std::fmt;
use std::mem;

use crate::routing::error::RouteError;

/// How a node's segment is matched against a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// Literal bytes, compared directly.
    Static,
    /// `:name`, one path segment up to the next `/`.
    Param { name: Box<str> },
    /// `/*name`, the rest of the path including its leading `/`.
    CatchAll { name: Box<str> },
}

/// Handler attached where a pattern terminates.
#[derive(Debug)]
pub(crate) struct Leaf<H> {
    pub(crate) pattern: Box<str>,
    pub(crate) handler: H,
}

#[derive(Debug)]
pub(crate) struct Node<H> {
    pub(crate) segment: Vec<u8>,
    pub(crate) kind: NodeKind,
    /// First byte of each static child, parallel to `children`.
    pub(crate) indices: Vec<u8>,
    pub(crate) wild_child: bool,
    pub(crate) children: Vec<Node<H>>,
    /// Number of handlers in this subtree, this node included.
    pub(crate) priority: u32,
    /// Most parameters any path through this subtree can capture.
    pub(crate) max_params: usize,
    pub(crate) leaf: Option<Leaf<H>>,
}

impl<H> Default for Node<H> {
    fn default() -> Self {
        Self::new(Vec::new(), NodeKind::Static)
    }
}

impl<H> Node<H> {
    fn new(segment: Vec<u8>, kind: NodeKind) -> Self {
        Self {
            segment,
            kind,
            indices: Vec::new(),
            wild_child: false,
            children: Vec::new(),
            priority: 0,
            max_params: 0,
            leaf: None,
        }
    }

    fn is_vacant(&self) -> bool {
        self.segment.is_empty() && self.children.is_empty() && self.leaf.is_none()
    }

    /// Position of the static child starting with `byte`.
    pub(crate) fn child_position(&self, byte: u8) -> Option<usize> {
        self.indices.iter().position(|&b| b == byte)
    }

    /// Whether appending `/` to a path ending at this node reaches a handler.
    pub(crate) fn trailing_slash_route(&self) -> bool {
        if self.wild_child {
            return matches!(self.children[0].kind, NodeKind::CatchAll { .. });
        }
        self.child_position(b'/').is_some_and(|i| {
            let child = &self.children[i];
            child.segment == b"/" && child.leaf.is_some()
        })
    }

    /// Some pattern registered in this subtree, used to name conflicts.
    fn any_pattern(&self) -> &str {
        if let Some(leaf) = &self.leaf {
            return &leaf.pattern;
        }
        self.children.first().map_or("", |child| child.any_pattern())
    }

    fn own_params(&self) -> usize {
        match self.kind {
            NodeKind::Static => 0,
            NodeKind::Param { .. } | NodeKind::CatchAll { .. } => 1,
        }
    }

    /// Whether `rest` continues with exactly this wildcard.
    fn accepts_wildcard(&self, rest: &[u8]) -> bool {
        let len = self.segment.len();
        match self.kind {
            NodeKind::Param { .. } => {
                rest.starts_with(&self.segment) && (rest.len() == len || rest[len] == b'/')
            }
            NodeKind::CatchAll { .. } => rest == self.segment.as_slice(),
            NodeKind::Static => false,
        }
    }

    /// Split this node so that its segment ends at `at`; the old node, with
    /// its suffix, children and handler, becomes the only child.
    fn split(&mut self, at: usize) {
        let suffix = self.segment.split_off(at);
        let child = Node {
            indices: mem::take(&mut self.indices),
            wild_child: mem::replace(&mut self.wild_child, false),
            children: mem::take(&mut self.children),
            priority: self.priority,
            max_params: self.max_params,
            leaf: self.leaf.take(),
            kind: NodeKind::Static,
            segment: suffix,
        };
        self.indices = vec![child.segment[0]];
        self.children = vec![child];
    }

    /// Walk an existing tree and attach `leaf` where `pattern` ends.
    ///
    /// Every child taken is recorded in `trail` so priorities can be settled
    /// once the insertion is known to succeed.
    fn insert_route(
        &mut self,
        pattern: &str,
        leaf: Leaf<H>,
        trail: &mut Vec<usize>,
    ) -> Result<(), RouteError> {
        let mut node = self;
        let mut rest = pattern.as_bytes();

        loop {
            let common = common_prefix(rest, &node.segment);
            if common < node.segment.len() {
                node.split(common);
            }
            rest = &rest[common..];

            if rest.is_empty() {
                if node.leaf.is_some() {
                    return Err(RouteError::DuplicateRoute {
                        pattern: pattern.to_string(),
                    });
                }
                node.leaf = Some(leaf);
                return Ok(());
            }

            if node.wild_child {
                let child = &node.children[0];
                if !child.accepts_wildcard(rest) {
                    return Err(RouteError::conflict(pattern, child.any_pattern()));
                }
                trail.push(0);
                node = &mut node.children[0];
                continue;
            }

            // A catch-all would also match the segment root ending here.
            if rest[0] == b'*' {
                return Err(RouteError::conflict(pattern, node.any_pattern()));
            }

            if rest[0] == b':' || rest.starts_with(b"/*") {
                if let Some(existing) = node.children.first() {
                    return Err(RouteError::conflict(pattern, existing.any_pattern()));
                }
                node.insert_remainder(rest, leaf, trail);
                return Ok(());
            }

            if let Some(i) = node.child_position(rest[0]) {
                trail.push(i);
                node = &mut node.children[i];
                continue;
            }

            node.indices.push(rest[0]);
            node.children.push(Node::default());
            let i = node.children.len() - 1;
            trail.push(i);
            node.children[i].insert_remainder(rest, leaf, trail);
            return Ok(());
        }
    }

    /// Build the chain of nodes for the unmatched remainder of a pattern.
    ///
    /// `self` is either a fresh node or an existing childless node and `rest`
    /// starts with a wildcard.
    fn insert_remainder(&mut self, mut rest: &[u8], leaf: Leaf<H>, trail: &mut Vec<usize>) {
        let mut node = self;

        loop {
            let Some(wildcard) = next_wildcard(rest) else {
                node.segment.extend_from_slice(rest);
                node.leaf = Some(leaf);
                return;
            };

            // the catch-all node owns the '/' in front of it
            let prefix_end = if wildcard.catch_all && wildcard.start > 0 {
                wildcard.start - 1
            } else {
                wildcard.start
            };
            node.segment.extend_from_slice(&rest[..prefix_end]);

            let name: Box<str> = String::from_utf8_lossy(&rest[wildcard.start + 1..wildcard.end])
                .into_owned()
                .into_boxed_str();
            let kind = if wildcard.catch_all {
                NodeKind::CatchAll { name }
            } else {
                NodeKind::Param { name }
            };

            node.wild_child = true;
            node.children
                .push(Node::new(rest[prefix_end..wildcard.end].to_vec(), kind));
            trail.push(0);
            node = &mut node.children[0];
            rest = &rest[wildcard.end..];

            if rest.is_empty() {
                node.leaf = Some(leaf);
                return;
            }
            if rest.starts_with(b"/*") {
                continue;
            }

            node.indices.push(rest[0]);
            node.children.push(Node::default());
            trail.push(0);
            node = &mut node.children[0];
        }
    }

    /// Count the new handler along `trail` and restore child order.
    fn settle(&mut self, trail: &[usize]) {
        self.priority += 1;
        if let Some((&pos, rest)) = trail.split_first() {
            self.children[pos].settle(rest);
            self.bump_child(pos);
        }
        self.max_params = self.own_params()
            + self
                .children
                .iter()
                .map(|child| child.max_params)
                .max()
                .unwrap_or(0);
    }

    /// Move a child whose priority just grew towards the front, one swap at
    /// a time. Equal priorities keep their relative order.
    fn bump_child(&mut self, pos: usize) {
        let priority = self.children[pos].priority;
        let mut at = pos;
        while at > 0 && self.children[at - 1].priority < priority {
            self.children.swap(at - 1, at);
            self.indices.swap(at - 1, at);
            at -= 1;
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(
            f,
            "{:indent$}{} [priority {}, params {}]",
            "",
            String::from_utf8_lossy(&self.segment),
            self.priority,
            self.max_params,
            indent = depth * 2
        )?;
        if let Some(leaf) = &self.leaf {
            write!(f, " => {}", leaf.pattern)?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Routes for a single HTTP method.
///
/// A tree is built with [`Tree::insert`] and then only read. Lookups take
/// `&self`, so a finished tree can be shared between threads freely.
#[derive(Debug)]
pub struct Tree<H> {
    pub(crate) root: Node<H>,
}

impl<H> Default for Tree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Tree<H> {
    pub fn new() -> Self {
        Self {
            root: Node::default(),
        }
    }

    /// Register `handler` for `pattern`.
    ///
    /// Patterns start with `/` and may contain `:name` parameters and one
    /// trailing `*name` catch-all. A failed insertion leaves every lookup
    /// result unchanged.
    pub fn insert(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        validate_pattern(pattern)?;

        let leaf = Leaf {
            pattern: pattern.into(),
            handler,
        };
        let mut trail = Vec::new();
        if self.root.is_vacant() {
            self.root.insert_remainder(pattern.as_bytes(), leaf, &mut trail);
        } else {
            self.root.insert_route(pattern, leaf, &mut trail)?;
        }
        self.root.settle(&trail);
        Ok(())
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.root.priority as usize
    }

    pub fn is_empty(&self) -> bool {
        self.root.priority == 0
    }

    /// Most parameters a single lookup can capture.
    pub fn max_params(&self) -> usize {
        self.root.max_params
    }
}

impl<H> fmt::Display for Tree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.render(f, 0)
    }
}

struct Wildcard {
    start: usize,
    end: usize,
    catch_all: bool,
}

/// Locate the first `:name` or `*name` token.
fn next_wildcard(path: &[u8]) -> Option<Wildcard> {
    let start = path.iter().position(|&b| b == b':' || b == b'*')?;
    let end = path[start + 1..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(path.len(), |i| start + 1 + i);
    Some(Wildcard {
        start,
        end,
        catch_all: path[start] == b'*',
    })
}

fn validate_pattern(pattern: &str) -> Result<(), RouteError> {
    let bytes = pattern.as_bytes();
    if bytes.is_empty() {
        return Err(RouteError::invalid(pattern, "pattern is empty"));
    }
    if bytes[0] != b'/' {
        return Err(RouteError::invalid(pattern, "pattern must begin with '/'"));
    }

    let mut names: Vec<&[u8]> = Vec::new();
    let mut offset = 0;
    while let Some(wildcard) = next_wildcard(&bytes[offset..]) {
        let start = offset + wildcard.start;
        let end = offset + wildcard.end;
        let name = &bytes[start + 1..end];

        if name.is_empty() {
            return Err(RouteError::invalid(pattern, "wildcards must have a non-empty name"));
        }
        if name.iter().any(|&b| b == b':' || b == b'*') {
            return Err(RouteError::invalid(
                pattern,
                "only one wildcard per path segment is allowed",
            ));
        }
        if names.contains(&name) {
            return Err(RouteError::invalid(pattern, "wildcard names must be unique"));
        }
        if wildcard.catch_all {
            if end != bytes.len() {
                return Err(RouteError::invalid(
                    pattern,
                    "catch-all must be the final path component",
                ));
            }
            if bytes[start - 1] != b'/' {
                return Err(RouteError::invalid(pattern, "catch-all must follow a '/'"));
            }
        }

        names.push(name);
        offset = end;
    }
    Ok(())
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(patterns: &[&'static str]) -> Tree<&'static str> {
        let mut tree = Tree::new();
        for pattern in patterns {
            tree.insert(pattern, *pattern).unwrap();
        }
        tree
    }

    fn segment<'a>(node: &'a Node<&str>) -> &'a str {
        std::str::from_utf8(&node.segment).unwrap()
    }

    #[test]
    fn test_split_shares_prefix() {
        let t = tree(&["/search", "/support"]);

        assert_eq!(segment(&t.root), "/s");
        assert_eq!(t.root.indices, b"eu");
        assert_eq!(segment(&t.root.children[0]), "earch");
        assert_eq!(segment(&t.root.children[1]), "upport");
        assert!(t.root.leaf.is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_split_keeps_handler_on_suffix() {
        let t = tree(&["/contact", "/co"]);

        assert_eq!(segment(&t.root), "/co");
        assert_eq!(t.root.leaf.as_ref().unwrap().pattern.as_ref(), "/co");
        let child = &t.root.children[0];
        assert_eq!(segment(child), "ntact");
        assert_eq!(child.leaf.as_ref().unwrap().handler, "/contact");
        assert_eq!(child.priority, 1);
        assert_eq!(t.root.priority, 2);
    }

    #[test]
    fn test_children_sorted_by_priority() {
        let t = tree(&["/a", "/b", "/b/c", "/b/d", "/c"]);

        assert_eq!(segment(&t.root), "/");
        assert_eq!(t.root.indices, b"bac");
        let priorities: Vec<u32> = t.root.children.iter().map(|c| c.priority).collect();
        assert_eq!(priorities, vec![3, 1, 1]);
        assert_eq!(t.root.priority, 5);
    }

    #[test]
    fn test_priority_ties_keep_insertion_order() {
        let t = tree(&["/x", "/y", "/z"]);
        assert_eq!(t.root.indices, b"xyz");
    }

    #[test]
    fn test_param_and_catch_all_nodes() {
        let t = tree(&["/user/:id/files/*path"]);

        assert_eq!(segment(&t.root), "/user/");
        assert!(t.root.wild_child);
        let param = &t.root.children[0];
        assert_eq!(param.kind, NodeKind::Param { name: "id".into() });
        let files = &param.children[0];
        assert_eq!(segment(files), "/files");
        let catch_all = &files.children[0];
        assert_eq!(segment(catch_all), "/*path");
        assert_eq!(catch_all.kind, NodeKind::CatchAll { name: "path".into() });
        assert!(catch_all.children.is_empty());
        assert_eq!(t.max_params(), 2);
    }

    #[test]
    fn test_max_params_is_subtree_maximum() {
        let t = tree(&["/a/:b/:c/:d", "/e/:f", "/g"]);
        assert_eq!(t.max_params(), 3);
        let e = t
            .root
            .children
            .iter()
            .find(|c| c.segment.starts_with(b"e"))
            .unwrap();
        assert_eq!(e.max_params, 1);
    }

    #[test]
    fn test_duplicate_route() {
        let mut t = tree(&["/users", "/users/:id", "/files/*path"]);

        for pattern in ["/users", "/users/:id", "/files/*path"] {
            assert_eq!(
                t.insert(pattern, "again"),
                Err(RouteError::DuplicateRoute {
                    pattern: pattern.to_string()
                })
            );
        }
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_static_then_param_conflicts() {
        let mut t = tree(&["/user/new"]);
        let err = t.insert("/user/:id", "param").unwrap_err();
        assert_eq!(err, RouteError::conflict("/user/:id", "/user/new"));
    }

    #[test]
    fn test_param_then_static_conflicts() {
        let mut t = tree(&["/user/:id"]);
        let err = t.insert("/user/new", "static").unwrap_err();
        assert_eq!(err, RouteError::conflict("/user/new", "/user/:id"));
    }

    #[test]
    fn test_wildcard_conflicts() {
        let cases: &[(&[&'static str], &str)] = &[
            (&["/user/:id"], "/user/:name"),
            (&["/user/:id"], "/user/:idx"),
            (&["/src/*path"], "/src/*file"),
            (&["/src/*path"], "/src/x"),
            (&["/src/*path"], "/srcx"),
            (&["/src/x"], "/src/*path"),
            (&["/src/"], "/src/*path"),
            (&["/src", "/src/a"], "/src/*path"),
            (&["/a"], "/*all"),
            (&["/*all"], "/a"),
            (&["/cmd/:tool/x"], "/cmd/:tool/*rest"),
            (&["/user_:name"], "/user_x"),
        ];

        for (existing, pattern) in cases {
            let mut t = tree(existing);
            let err = t.insert(pattern, "new").unwrap_err();
            assert!(
                matches!(err, RouteError::RouteConflict { .. }),
                "{pattern} after {existing:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_compatible_wildcards() {
        let t = tree(&[
            "/",
            "/src",
            "/src/*filepath",
            "/user/",
            "/user/:id",
            "/user/:id/profile",
            "/user/:id/files/*path",
            "/cmd/:tool/:sub",
            "/cmd/:tool/",
            "/user_:name",
            "/user_:name/about",
        ]);
        assert_eq!(t.len(), 11);
    }

    #[test]
    fn test_invalid_patterns() {
        let cases = [
            "",
            "user",
            "/user/:",
            "/src/*",
            "/:a:b",
            "/user/:id/:id",
            "/src/*path/more",
            "/src*path",
        ];

        for pattern in cases {
            let mut t: Tree<()> = Tree::new();
            let err = t.insert(pattern, ()).unwrap_err();
            assert!(
                matches!(err, RouteError::InvalidPattern { .. }),
                "{pattern:?} gave {err:?}"
            );
            assert!(t.is_empty());
        }
    }

    #[test]
    fn test_rejected_insert_keeps_priorities() {
        let mut t = tree(&["/user/new", "/user/old", "/about"]);
        let before: Vec<u32> = t.root.children.iter().map(|c| c.priority).collect();

        assert!(t.insert("/user/:id", "param").is_err());

        let after: Vec<u32> = t.root.children.iter().map(|c| c.priority).collect();
        assert_eq!(before, after);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_display_renders_shape() {
        let t = tree(&["/hello/:name", "/help"]);
        let rendered = t.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "/hel [priority 2, params 1]");
        assert_eq!(lines[1], "  lo/ [priority 1, params 1]");
        assert_eq!(lines[2], "    :name [priority 1, params 1] => /hello/:name");
        assert_eq!(lines[3], "  p [priority 1, params 0] => /help");
    }
}
