//! Path parameters captured during a lookup.

use serde::Serialize;

/// A single captured parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Parameters borrowed from the tree (names) and the request path (values),
/// in the order they appear in the pattern.
///
/// The backing vector is only allocated when the first parameter is pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a> {
    inner: Vec<Param<'a>>,
}

impl<'a> Params<'a> {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Push a parameter, reserving `capacity` slots on the first push so a
    /// single allocation covers the whole lookup.
    pub(crate) fn push(&mut self, key: &'a str, value: &'a str, capacity: usize) {
        if self.inner.capacity() == 0 {
            self.inner.reserve_exact(capacity.max(1));
        }
        self.inner.push(Param { key, value });
    }

    /// Value of the first parameter with the given name.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.inner.iter().find(|p| p.key == key).map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param<'a>> {
        self.inner.iter()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Copy into an owned form that can outlive the path and the tree.
    pub fn to_owned_params(&self) -> PathParams {
        PathParams(
            self.inner
                .iter()
                .map(|p| (p.key.to_string(), p.value.to_string()))
                .collect(),
        )
    }
}

impl<'p, 'a> IntoIterator for &'p Params<'a> {
    type Item = &'p Param<'a>;
    type IntoIter = std::slice::Iter<'p, Param<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Owned parameters, attached to a request's extensions by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
