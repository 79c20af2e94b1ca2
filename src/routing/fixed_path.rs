//! Case-insensitive path correction.
//!
//! Used for redirects only: given a path that did not match, find the
//! registered spelling of it. Static segments are rebuilt from the bytes stored
//! in the tree, parameter values are copied from the input unchanged.

use crate::routing::tree::{Node, NodeKind, Tree};

impl<H> Tree<H> {
    /// Find the registered path that `path` matches when compared with ASCII
    /// case folding.
    ///
    /// With `fix_trailing_slash`, a single trailing `/` may also be added or
    /// removed. `path` is expected to be cleaned already.
    pub fn find_case_insensitive(&self, path: &str, fix_trailing_slash: bool) -> Option<String> {
        let mut out = Vec::with_capacity(path.len() + 1);
        if self
            .root
            .fix_case(path.as_bytes(), &mut out, fix_trailing_slash)
        {
            String::from_utf8(out).ok()
        } else {
            None
        }
    }
}

impl<H> Node<H> {
    /// Try to match `path` below (and including) this node, appending the
    /// corrected bytes to `out`. On failure `out` is left as it was.
    fn fix_case(&self, path: &[u8], out: &mut Vec<u8>, fix_tsr: bool) -> bool {
        match self.kind {
            NodeKind::Static => self.fix_static(path, out, fix_tsr),
            NodeKind::Param { .. } => self.fix_param(path, out, fix_tsr),
            NodeKind::CatchAll { .. } => {
                if path.first() != Some(&b'/') {
                    return false;
                }
                out.extend_from_slice(path);
                true
            }
        }
    }

    fn fix_static(&self, path: &[u8], out: &mut Vec<u8>, fix_tsr: bool) -> bool {
        let segment = self.segment.as_slice();

        if path.len() < segment.len() || !path[..segment.len()].eq_ignore_ascii_case(segment) {
            // only a missing trailing slash can still be fixed here
            let fixable = fix_tsr
                && self.leaf.is_some()
                && segment.len() == path.len() + 1
                && segment[path.len()] == b'/'
                && path.eq_ignore_ascii_case(&segment[..path.len()]);
            if fixable {
                out.extend_from_slice(segment);
            }
            return fixable;
        }

        let mark = out.len();
        out.extend_from_slice(segment);
        if self.descend(&path[segment.len()..], out, fix_tsr) {
            return true;
        }
        out.truncate(mark);
        false
    }

    fn fix_param(&self, path: &[u8], out: &mut Vec<u8>, fix_tsr: bool) -> bool {
        let end = path.iter().position(|&b| b == b'/').unwrap_or(path.len());
        if end == 0 {
            return false;
        }

        let mark = out.len();
        out.extend_from_slice(&path[..end]);
        if self.descend(&path[end..], out, fix_tsr) {
            return true;
        }
        out.truncate(mark);
        false
    }

    /// Continue below a node whose own bytes are already in `out`.
    fn descend(&self, rest: &[u8], out: &mut Vec<u8>, fix_tsr: bool) -> bool {
        if rest.is_empty() {
            if self.leaf.is_some() {
                return true;
            }
            if fix_tsr && self.trailing_slash_route() {
                out.push(b'/');
                return true;
            }
            return false;
        }

        if self.wild_child {
            if self.children[0].fix_case(rest, out, fix_tsr) {
                return true;
            }
        } else {
            // `/A...` and `/a...` may both be registered
            let candidates = self
                .indices
                .iter()
                .zip(&self.children)
                .filter(|(index, _)| index.eq_ignore_ascii_case(&rest[0]));
            for (_, child) in candidates {
                if child.fix_case(rest, out, fix_tsr) {
                    return true;
                }
            }
        }

        // drop the trailing slash
        fix_tsr && rest == b"/" && self.leaf.is_some()
    }
}
