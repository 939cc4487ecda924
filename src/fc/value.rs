//! Typed values inferred from tag text, and the trees built from them.
//!
//! [`normalize`] runs a fixed, ordered cascade of rules over the trimmed
//! text; the first rule that produces a value wins. Order matters: the word
//! `true` must become a boolean before the text rule sees it, and `42` must
//! become a number before the structured rule is tried.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A scalar or structured value inferred from a tag's text content.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Empty or whitespace-only text.
    Empty,
    Boolean(bool),
    Number(serde_json::Number),
    /// A JSON object or array.
    Structured(serde_json::Value),
    Text(String),
}

impl Value {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Literal text form of the value (`""` for [`Value::Empty`]).
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Value::Empty => Cow::Borrowed(""),
            Value::Boolean(true) => Cow::Borrowed("true"),
            Value::Boolean(false) => Cow::Borrowed("false"),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Structured(v) => Cow::Owned(v.to_string()),
            Value::Text(text) => Cow::Borrowed(text),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Empty => serde_json::Value::String(String::new()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::Structured(v) => v.clone(),
            Value::Text(text) => serde_json::Value::String(text.clone()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_str(""),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::Structured(v) => v.serialize(serializer),
            Value::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Entry of a [`ParameterTree`]: a leaf value or a nested tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Value(Value),
    Tree(ParameterTree),
}

impl Node {
    /// Convert decoded JSON into a node.
    ///
    /// Objects become trees, arrays stay structured, `null` and `""` become
    /// [`Value::Empty`].
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Node::Tree(ParameterTree::from_json_object(map)),
            serde_json::Value::Array(_) => Node::Value(Value::Structured(value)),
            serde_json::Value::String(s) if s.is_empty() => Node::Value(Value::Empty),
            serde_json::Value::String(s) => Node::Value(Value::Text(s)),
            serde_json::Value::Bool(b) => Node::Value(Value::Boolean(b)),
            serde_json::Value::Number(n) => Node::Value(Value::Number(n)),
            serde_json::Value::Null => Node::Value(Value::Empty),
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            Node::Tree(_) => None,
        }
    }

    #[must_use]
    pub fn as_tree(&self) -> Option<&ParameterTree> {
        match self {
            Node::Tree(tree) => Some(tree),
            Node::Value(_) => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Value(value) => value.to_json(),
            Node::Tree(tree) => tree.to_json(),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

impl From<ParameterTree> for Node {
    fn from(tree: ParameterTree) -> Self {
        Node::Tree(tree)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Node::from_json)
    }
}

/// Mapping from tag name to value, built from nested tag pairs.
///
/// Inserting an existing key replaces the earlier entry, so a sibling tag
/// that repeats keeps only its last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterTree(BTreeMap<String, Node>);

impl ParameterTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` under `key`, returning the entry it replaced.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.0.insert(key.into(), node.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn from_json_object(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(
            map.into_iter()
                .map(|(k, v)| (k, Node::from_json(v)))
                .collect(),
        )
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Normalization cascade
// ---------------------------------------------------------------------------

/// One step of the cascade. `apply` receives trimmed text and returns `None`
/// to hand over to the next rule.
#[derive(Clone, Copy)]
pub struct NormalizeRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<Value>,
}

/// The cascade, in evaluation order.
pub const NORMALIZE_RULES: [NormalizeRule; 5] = [
    NormalizeRule {
        name: "empty",
        apply: empty_rule,
    },
    NormalizeRule {
        name: "boolean",
        apply: boolean_rule,
    },
    NormalizeRule {
        name: "number",
        apply: number_rule,
    },
    NormalizeRule {
        name: "structured",
        apply: structured_rule,
    },
    NormalizeRule {
        name: "text",
        apply: text_rule,
    },
];

/// Infer a typed [`Value`] from raw tag text.
#[must_use]
pub fn normalize(text: &str) -> Value {
    let trimmed = text.trim();
    NORMALIZE_RULES
        .iter()
        .find_map(|rule| (rule.apply)(trimmed))
        .unwrap_or_else(|| Value::Text(trimmed.to_owned()))
}

fn empty_rule(trimmed: &str) -> Option<Value> {
    trimmed.is_empty().then_some(Value::Empty)
}

fn boolean_rule(trimmed: &str) -> Option<Value> {
    if trimmed.eq_ignore_ascii_case("true") {
        Some(Value::Boolean(true))
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(Value::Boolean(false))
    } else {
        None
    }
}

fn number_rule(trimmed: &str) -> Option<Value> {
    // `f64::from_str` also accepts `inf`/`nan`; only decimal literals qualify.
    let bytes = trimmed.as_bytes();
    if !bytes.iter().any(u8::is_ascii_digit)
        || !bytes
            .iter()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    if let Ok(uint) = trimmed.parse::<u64>() {
        return Some(Value::Number(uint.into()));
    }
    let float = trimmed.parse::<f64>().ok()?;
    serde_json::Number::from_f64(float).map(Value::Number)
}

pub(crate) fn structured_rule(trimmed: &str) -> Option<Value> {
    let delimited = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !delimited {
        return None;
    }
    serde_json::from_str(trimmed).ok().map(Value::Structured)
}

fn text_rule(trimmed: &str) -> Option<Value> {
    Some(Value::Text(trimmed.to_owned()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
