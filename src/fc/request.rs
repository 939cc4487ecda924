use serde::{Deserialize, Serialize};

use super::value::{Node, ParameterTree};

/// A validated tool-call request, ready to hand to a dispatcher.
///
/// Only produced by [`crate::fc::validator::validate`], so the name formats
/// and the mapping shape of `arguments` always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedToolRequest {
    tool_name: String,
    server_name: String,
    arguments: ParameterTree,
    raw_text: String,
}

impl ParsedToolRequest {
    pub(crate) fn new_unchecked(
        tool_name: String,
        server_name: String,
        arguments: ParameterTree,
        raw_text: String,
    ) -> Self {
        Self {
            tool_name,
            server_name,
            arguments,
            raw_text,
        }
    }

    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    #[must_use]
    pub fn arguments(&self) -> &ParameterTree {
        &self.arguments
    }

    /// The matched block, delimiters included.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    #[must_use]
    pub fn into_arguments(self) -> ParameterTree {
        self.arguments
    }
}

/// An unvalidated request, as assembled by the builder or submitted by an
/// external caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolRequestCandidate {
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub server_name: String,
    pub arguments: Node,
    #[serde(default)]
    pub raw_text: String,
}
