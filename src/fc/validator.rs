use std::sync::LazyLock;

use regex_lite::Regex;

use super::request::{ParsedToolRequest, ToolRequestCandidate};
use super::value::{Node, ParameterTree, Value};
use crate::error::{FailureReason, Field, ParseFailure};

const SERVER_NAME_PATTERN: &str = r"^[a-z][a-z0-9-]*$";
const TOOL_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

static SERVER_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(SERVER_NAME_PATTERN).ok());
static TOOL_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(TOOL_NAME_PATTERN).ok());

#[must_use]
pub fn is_valid_server_name(name: &str) -> bool {
    SERVER_NAME_RE.as_ref().is_some_and(|re| re.is_match(name))
}

#[must_use]
pub fn is_valid_tool_name(name: &str) -> bool {
    TOOL_NAME_RE.as_ref().is_some_and(|re| re.is_match(name))
}

/// Validate a candidate request and promote it to a [`ParsedToolRequest`].
///
/// Checks run in a fixed order and stop at the first failure:
/// 1. `tool_name` is non-empty
/// 2. `server_name` is non-empty
/// 3. `arguments` is a mapping (a tree, or a structured JSON object)
/// 4. `server_name` matches `^[a-z][a-z0-9-]*$`
/// 5. `tool_name` matches `^[a-z][a-z0-9_]*$`
///
/// # Errors
///
/// Returns a [`ParseFailure`] carrying the candidate's raw text and the
/// reason of the first failed check.
pub fn validate(candidate: ToolRequestCandidate) -> Result<ParsedToolRequest, ParseFailure> {
    let ToolRequestCandidate {
        tool_name,
        server_name,
        arguments,
        raw_text,
    } = candidate;

    if tool_name.is_empty() {
        return Err(ParseFailure::new(
            FailureReason::MissingField(Field::ToolName),
            raw_text,
        ));
    }
    if server_name.is_empty() {
        return Err(ParseFailure::new(
            FailureReason::MissingField(Field::ServerName),
            raw_text,
        ));
    }
    let Some(arguments) = into_mapping(arguments) else {
        return Err(ParseFailure::new(
            FailureReason::InvalidStructure(Field::Arguments),
            raw_text,
        ));
    };
    if !is_valid_server_name(&server_name) {
        return Err(ParseFailure::new(
            FailureReason::InvalidFormat {
                field: Field::ServerName,
                value: server_name,
            },
            raw_text,
        ));
    }
    if !is_valid_tool_name(&tool_name) {
        return Err(ParseFailure::new(
            FailureReason::InvalidFormat {
                field: Field::ToolName,
                value: tool_name,
            },
            raw_text,
        ));
    }

    Ok(ParsedToolRequest::new_unchecked(
        tool_name,
        server_name,
        arguments,
        raw_text,
    ))
}

fn into_mapping(node: Node) -> Option<ParameterTree> {
    match node {
        Node::Tree(tree) => Some(tree),
        Node::Value(Value::Structured(serde_json::Value::Object(map))) => {
            Some(ParameterTree::from_json_object(map))
        }
        Node::Value(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(server: &str, tool: &str, arguments: Node) -> ToolRequestCandidate {
        ToolRequestCandidate {
            tool_name: tool.to_string(),
            server_name: server.to_string(),
            arguments,
            raw_text: "<use_mcp_tool>...</use_mcp_tool>".to_string(),
        }
    }

    fn empty_args() -> Node {
        Node::Tree(ParameterTree::new())
    }

    #[test]
    fn test_valid_candidate() {
        let mut args = ParameterTree::new();
        args.insert("path", Value::Text("/tmp".into()));
        let request = validate(candidate("file-system", "read_file", Node::Tree(args))).unwrap();
        assert_eq!(request.server_name(), "file-system");
        assert_eq!(request.tool_name(), "read_file");
        assert_eq!(request.arguments().to_json(), json!({"path": "/tmp"}));
        assert_eq!(request.raw_text(), "<use_mcp_tool>...</use_mcp_tool>");
    }

    #[test]
    fn test_structured_object_arguments_become_tree() {
        let args = Node::Value(Value::Structured(json!({"a": {"b": 1}})));
        let request = validate(candidate("srv", "tool", args)).unwrap();
        let nested = request.arguments().get("a").and_then(Node::as_tree).unwrap();
        assert_eq!(nested.get("b"), Some(&Node::Value(Value::Number(1.into()))));
    }

    #[test]
    fn test_missing_tool_name() {
        let err = validate(candidate("srv", "", empty_args())).unwrap_err();
        assert_eq!(err.reason(), &FailureReason::MissingField(Field::ToolName));
        assert_eq!(err.raw_text(), "<use_mcp_tool>...</use_mcp_tool>");
    }

    #[test]
    fn test_missing_server_name() {
        let err = validate(candidate("", "tool", empty_args())).unwrap_err();
        assert_eq!(err.reason(), &FailureReason::MissingField(Field::ServerName));
    }

    #[test]
    fn test_tool_name_checked_before_server_name() {
        let err = validate(candidate("", "", empty_args())).unwrap_err();
        assert_eq!(err.reason(), &FailureReason::MissingField(Field::ToolName));
    }

    #[test]
    fn test_bare_string_arguments_rejected() {
        let err = validate(candidate(
            "srv",
            "tool",
            Node::Value(Value::Text("not a map".into())),
        ))
        .unwrap_err();
        assert_eq!(err.code(), "invalid-structure");
        assert_eq!(err.field(), Field::Arguments);
    }

    #[test]
    fn test_array_arguments_rejected() {
        let err = validate(candidate(
            "srv",
            "tool",
            Node::Value(Value::Structured(json!([1, 2]))),
        ))
        .unwrap_err();
        assert_eq!(err.code(), "invalid-structure");
    }

    #[test]
    fn test_structure_checked_before_formats() {
        let err = validate(candidate("Bad", "Bad", Node::Value(Value::Empty))).unwrap_err();
        assert_eq!(err.code(), "invalid-structure");
    }

    #[test]
    fn test_uppercase_server_name_rejected() {
        let err = validate(candidate("Server1", "tool", empty_args())).unwrap_err();
        assert_eq!(
            err.reason(),
            &FailureReason::InvalidFormat {
                field: Field::ServerName,
                value: "Server1".into()
            }
        );
    }

    #[test]
    fn test_server_format_checked_before_tool_format() {
        let err = validate(candidate("Srv", "Tool", empty_args())).unwrap_err();
        assert_eq!(err.field(), Field::ServerName);
    }

    #[test]
    fn test_tool_name_with_hyphen_rejected() {
        let err = validate(candidate("srv", "read-file", empty_args())).unwrap_err();
        assert_eq!(
            err.reason(),
            &FailureReason::InvalidFormat {
                field: Field::ToolName,
                value: "read-file".into()
            }
        );
    }

    #[test]
    fn test_name_patterns() {
        assert!(is_valid_server_name("github"));
        assert!(is_valid_server_name("my-server-2"));
        assert!(!is_valid_server_name("my_server"));
        assert!(!is_valid_server_name("2fast"));
        assert!(!is_valid_server_name("-x"));

        assert!(is_valid_tool_name("list_issues"));
        assert!(is_valid_tool_name("t1"));
        assert!(!is_valid_tool_name("_hidden"));
        assert!(!is_valid_tool_name("get data"));
        assert!(!is_valid_tool_name(""));
    }

    #[test]
    fn test_candidate_deserializes_from_json() {
        let candidate: ToolRequestCandidate = serde_json::from_value(json!({
            "server_name": "weather",
            "tool_name": "forecast",
            "arguments": {"city": "Oslo", "days": 3}
        }))
        .unwrap();
        assert!(candidate.raw_text.is_empty());
        let request = validate(candidate).unwrap();
        assert_eq!(
            request.arguments().to_json(),
            json!({"city": "Oslo", "days": 3})
        );
    }
}
