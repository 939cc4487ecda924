//! Tool request builder: one raw block to one validated request.
//!
//! 1. Parse the block body into a [`ParameterTree`].
//! 2. Require `server_name`, `tool_name` and `arguments`, in that order.
//! 3. Decode `arguments` from JSON when the tree holds it as plain text.
//! 4. Render the names to text and run the validator.

use super::request::{ParsedToolRequest, ToolRequestCandidate};
use super::tree::TreeParser;
use super::validator::validate;
use super::value::{Node, ParameterTree, Value};
use crate::error::{FailureReason, Field, ParseFailure, ToolCallError};

/// One complete top-level tool-call element borrowed from the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlock<'a> {
    text: &'a str,
    body: &'a str,
    offset: usize,
}

impl<'a> RawBlock<'a> {
    pub(crate) const fn new(text: &'a str, body: &'a str, offset: usize) -> Self {
        Self { text, body, offset }
    }

    /// The whole element, delimiters included.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Content between the delimiters.
    #[must_use]
    pub const fn body(&self) -> &'a str {
        self.body
    }

    /// Byte offset of the element in the scanned text.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToolRequestBuilder {
    tree_parser: TreeParser,
}

impl ToolRequestBuilder {
    #[must_use]
    pub const fn new(tree_parser: TreeParser) -> Self {
        Self { tree_parser }
    }

    /// Build and validate the request held by `block`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::Parse`] when a required key is missing,
    /// `arguments` is not decodable JSON, or validation fails.
    pub fn build(&self, block: RawBlock<'_>) -> Result<ParsedToolRequest, ToolCallError> {
        let raw = block.text();
        let mut tree = self.tree_parser.parse(block.body());

        let server_name = take_required(&mut tree, Field::ServerName, raw)?;
        let tool_name = take_required(&mut tree, Field::ToolName, raw)?;
        let arguments = take_required(&mut tree, Field::Arguments, raw)?;
        let arguments = resolve_arguments(arguments, raw)?;

        let candidate = ToolRequestCandidate {
            server_name: render_name(server_name, Field::ServerName, raw)?,
            tool_name: render_name(tool_name, Field::ToolName, raw)?,
            arguments,
            raw_text: raw.to_owned(),
        };
        let request = validate(candidate)?;

        tracing::debug!(
            "built tool request {}/{} ({} argument keys) at byte {}",
            request.server_name(),
            request.tool_name(),
            request.arguments().len(),
            block.offset(),
        );
        Ok(request)
    }
}

fn take_required(tree: &mut ParameterTree, field: Field, raw: &str) -> Result<Node, ParseFailure> {
    tree.remove(field.as_str())
        .ok_or_else(|| ParseFailure::new(FailureReason::MissingField(field), raw))
}

/// Plain text arguments are decoded as JSON; trees and structured values
/// pass through for the validator to judge.
fn resolve_arguments(node: Node, raw: &str) -> Result<Node, ParseFailure> {
    let Node::Value(Value::Text(text)) = node else {
        return Ok(node);
    };
    serde_json::from_str::<serde_json::Value>(&text)
        .map(Node::from_json)
        .map_err(|err| {
            ParseFailure::new(
                FailureReason::MalformedJson {
                    field: Field::Arguments,
                    detail: err.to_string(),
                },
                raw,
            )
        })
}

fn render_name(node: Node, field: Field, raw: &str) -> Result<String, ParseFailure> {
    match node {
        Node::Value(value) => Ok(value.render().into_owned()),
        Node::Tree(_) => Err(ParseFailure::new(
            FailureReason::InvalidStructure(field),
            raw,
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
