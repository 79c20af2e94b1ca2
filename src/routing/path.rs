//! Path canonicalization.

use std::borrow::Cow;

/// Canonical form of a URL path.
///
/// - repeated `/` collapse into one
/// - `.` elements are dropped
/// - `..` removes the previous element, and is ignored at the root
///
/// A trailing `/` is kept only if `path` had one. The result always starts
/// with `/`. When `path` is already canonical it is returned borrowed;
/// otherwise a single `String` is allocated.
pub fn clean(path: &str) -> Cow<'_, str> {
    if path.is_empty() {
        return Cow::Borrowed("/");
    }

    let src = path.as_bytes();
    let mut buf = CleanBuf::new(path);
    let mut r = 0;

    if src[0] != b'/' {
        // the output diverges at position 0
        buf.push(b'/');
    } else {
        buf.push(b'/');
        r = 1;
    }

    while r < src.len() {
        let end = src[r..]
            .iter()
            .position(|&b| b == b'/')
            .map_or(src.len(), |i| r + i);
        let element = &src[r..end];

        match element {
            b"" | b"." => {}
            b".." => buf.pop_element(),
            _ => {
                if buf.len() > 1 {
                    buf.push(b'/');
                }
                buf.extend(element);
            }
        }
        r = end + 1;
    }

    let trailing = src.len() > 1 && src[src.len() - 1] == b'/';
    if trailing && buf.len() > 1 {
        buf.push(b'/');
    }

    buf.finish()
}

/// Output buffer that stays a view of the input until the first byte that
/// differs, at which point the common prefix is copied once.
struct CleanBuf<'a> {
    src: &'a str,
    buf: Option<Vec<u8>>,
    w: usize,
}

impl<'a> CleanBuf<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            buf: None,
            w: 0,
        }
    }

    fn len(&self) -> usize {
        self.w
    }

    fn push(&mut self, byte: u8) {
        match &mut self.buf {
            Some(buf) => {
                buf.truncate(self.w);
                buf.push(byte);
            }
            None => {
                if self.src.as_bytes().get(self.w) != Some(&byte) {
                    let mut buf = Vec::with_capacity(self.src.len() + 1);
                    buf.extend_from_slice(&self.src.as_bytes()[..self.w]);
                    buf.push(byte);
                    self.buf = Some(buf);
                }
            }
        }
        self.w += 1;
    }

    fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    /// Drop the last element and its separator, never the leading `/`.
    fn pop_element(&mut self) {
        let written = match &self.buf {
            Some(buf) => &buf[..self.w],
            None => &self.src.as_bytes()[..self.w],
        };
        self.w = written
            .iter()
            .rposition(|&b| b == b'/')
            .map_or(1, |i| i.max(1));
    }

    fn finish(self) -> Cow<'a, str> {
        match self.buf {
            None if self.w == self.src.len() => Cow::Borrowed(self.src),
            None => Cow::Borrowed(&self.src[..self.w]),
            Some(mut buf) => {
                buf.truncate(self.w);
                // only whole elements of a valid str were copied
                Cow::Owned(String::from_utf8_lossy(&buf).into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(&str, &str)] = &[
        ("", "/"),
        ("/", "/"),
        ("abc", "/abc"),
        ("a/b/c", "/a/b/c"),
        ("/abc", "/abc"),
        ("/abc/", "/abc/"),
        ("//", "/"),
        ("/abc//", "/abc/"),
        ("/abc//def//ghi", "/abc/def/ghi"),
        ("//abc", "/abc"),
        ("///abc", "/abc"),
        ("/.", "/"),
        ("/./", "/"),
        ("/abc/./def", "/abc/def"),
        ("/abc/.", "/abc"),
        ("/abc/./", "/abc/"),
        ("/..", "/"),
        ("/../", "/"),
        ("/../../abc", "/abc"),
        ("/abc/def/..", "/abc"),
        ("/abc/def/../", "/abc/"),
        ("/abc/def/../ghi", "/abc/ghi"),
        ("/abc/def/../..", "/"),
        ("/abc/def/../../..", "/"),
        ("/abc/def/../../../ghi/jkl/../../../mno", "/mno"),
        ("/a//b/../c/.", "/a/c"),
        ("/abc/...", "/abc/..."),
        ("/.hidden/x", "/.hidden/x"),
        ("/ünìcodé/../é/", "/é/"),
    ];

    #[test]
    fn test_clean_cases() {
        for (input, expected) in CASES {
            assert_eq!(clean(input), *expected, "clean({input:?})");
        }
    }

    #[test]
    fn test_clean_is_idempotent() {
        for (input, expected) in CASES {
            assert_eq!(clean(expected), *expected, "clean({expected:?}) after {input:?}");
        }
    }

    #[test]
    fn test_canonical_input_is_borrowed() {
        for path in ["/", "/abc", "/abc/", "/a/b/c", "/é/x/"] {
            assert!(matches!(clean(path), Cow::Borrowed(_)), "{path}");
        }
    }

    #[test]
    fn test_shortened_prefix_is_borrowed() {
        // a dropped tail needs no copy
        assert!(matches!(clean("/abc/."), Cow::Borrowed("/abc")));
        assert!(matches!(clean("/abc/def/.."), Cow::Borrowed("/abc")));
    }

    #[test]
    fn test_rewritten_input_is_owned() {
        for path in ["abc", "//abc", "/a/../b", "/a/./b"] {
            assert!(matches!(clean(path), Cow::Owned(_)), "{path}");
        }
    }
}
