//! Parameter tree parser: nested tag pairs to [`ParameterTree`].
//!
//! Tag pairs are matched with an explicit depth-counting scanner: after an
//! opening `<name>` it counts further `<name>` openings and stops at the
//! `</name>` that brings the depth back to zero. A pair whose closing tag
//! never balances produces nothing and scanning resumes one byte after its
//! opening `<`, so well-formed pairs inside it are still found.
//!
//! Every level is parsed the same way: text between pairs is dropped.
//! Inner content that reads as a JSON object or array stays structured even
//! when its strings hold markup. Other inner content that holds a complete
//! tag pair is parsed recursively. A recursive parse that goes past the depth
//! limit falls back to normalizing the raw inner content as a scalar, and the
//! failure never crosses the entry it belongs to.

use memchr::memchr;

use super::value::{normalize, structured_rule, Node, ParameterTree};

/// Default limit on nested tree levels below a block body.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// Why a nested parse was abandoned in favour of a scalar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NestedParseError {
    #[error("nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}

/// Parse `content` with the default nesting limit.
#[must_use]
pub fn parse_parameter_tree(content: &str) -> ParameterTree {
    TreeParser::default().parse(content)
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParser {
    max_depth: usize,
}

impl Default for TreeParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NESTING_DEPTH)
    }
}

impl TreeParser {
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse a block body. Text between pairs is ignored, as are unmatched
    /// or mismatched tags.
    #[must_use]
    pub fn parse(&self, content: &str) -> ParameterTree {
        self.parse_level(content, 0)
    }

    /// Parse `content` as a nested level one below a block body.
    ///
    /// # Errors
    ///
    /// Returns [`NestedParseError::TooDeep`] when the content is nested
    /// deeper than the configured limit.
    pub fn try_parse(&self, content: &str) -> Result<ParameterTree, NestedParseError> {
        self.parse_nested(content, 1)
    }

    fn parse_entry(&self, inner: &str, depth: usize) -> Node {
        if let Some(value) = structured_rule(inner.trim()) {
            return Node::Value(value);
        }
        if !contains_tag_pair(inner) {
            return Node::Value(normalize(inner));
        }
        self.parse_nested(inner, depth)
            .map(Node::Tree)
            .unwrap_or_else(|err| {
                tracing::trace!("nested parse fell back to scalar: {err}");
                Node::Value(normalize(inner))
            })
    }

    fn parse_nested(&self, content: &str, depth: usize) -> Result<ParameterTree, NestedParseError> {
        if depth > self.max_depth {
            return Err(NestedParseError::TooDeep {
                limit: self.max_depth,
            });
        }
        Ok(self.parse_level(content, depth))
    }

    fn parse_level(&self, content: &str, depth: usize) -> ParameterTree {
        let mut tree = ParameterTree::new();
        for pair in TagPairs::new(content) {
            tree.insert(pair.name, self.parse_entry(pair.inner, depth + 1));
        }
        tree
    }
}

#[inline]
fn contains_tag_pair(text: &str) -> bool {
    TagPairs::new(text).next().is_some()
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagPair<'a> {
    name: &'a str,
    inner: &'a str,
}

/// Iterator over balanced top-level tag pairs of one nesting level.
struct TagPairs<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> TagPairs<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }
}

impl<'a> Iterator for TagPairs<'a> {
    type Item = TagPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while let Some(rel_lt) = memchr(b'<', &bytes[self.cursor..]) {
            let start = self.cursor + rel_lt;
            let Some(name_len) = open_tag_name_len(&bytes[start..]) else {
                self.cursor = start + 1;
                continue;
            };
            // Tag names are ASCII, so every offset below is a char boundary.
            let name = &self.text[start + 1..start + 1 + name_len];
            let inner_start = start + name_len + 2;
            let Some((close_start, close_end)) =
                find_matching_close(bytes, name.as_bytes(), inner_start)
            else {
                self.cursor = start + 1;
                continue;
            };
            self.cursor = close_end;
            return Some(TagPair {
                name,
                inner: &self.text[inner_start..close_start],
            });
        }
        self.cursor = bytes.len();
        None
    }
}

#[inline]
const fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[inline]
const fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-')
}

/// Whether `name` is usable as a tag name (`[A-Za-z0-9_][A-Za-z0-9_-]*`).
#[must_use]
pub fn is_valid_tag_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.first().copied().is_some_and(is_name_start) && bytes.iter().copied().all(is_name_char)
}

/// Length of the name in an opening tag `<name>` at the start of `bytes`.
#[inline]
fn open_tag_name_len(bytes: &[u8]) -> Option<usize> {
    if !bytes.get(1).copied().is_some_and(is_name_start) {
        return None;
    }
    let mut idx = 2usize;
    while bytes.get(idx).copied().is_some_and(is_name_char) {
        idx += 1;
    }
    (bytes.get(idx) == Some(&b'>')).then_some(idx - 1)
}

#[inline]
fn is_open_tag_at(bytes: &[u8], pos: usize, name: &[u8]) -> bool {
    let rest = &bytes[pos..];
    rest.len() >= name.len() + 2
        && &rest[1..=name.len()] == name
        && rest[name.len() + 1] == b'>'
}

#[inline]
fn is_close_tag_at(bytes: &[u8], pos: usize, name: &[u8]) -> bool {
    let rest = &bytes[pos..];
    rest.len() >= name.len() + 3
        && rest[1] == b'/'
        && &rest[2..name.len() + 2] == name
        && rest[name.len() + 2] == b'>'
}

/// Find the `</name>` that balances an already consumed `<name>`.
///
/// Returns the offsets of its `<` and one past its `>`.
fn find_matching_close(bytes: &[u8], name: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut cursor = from;
    while let Some(rel_lt) = memchr(b'<', &bytes[cursor..]) {
        let pos = cursor + rel_lt;
        if is_open_tag_at(bytes, pos, name) {
            depth += 1;
            cursor = pos + name.len() + 2;
        } else if is_close_tag_at(bytes, pos, name) {
            depth -= 1;
            let close_end = pos + name.len() + 3;
            if depth == 0 {
                return Some((pos, close_end));
            }
            cursor = close_end;
        } else {
            cursor = pos + 1;
        }
    }
    None
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
