pub mod builder;
pub mod extract;
pub mod request;
pub mod tree;
pub mod validator;
pub mod value;

pub use builder::{RawBlock, ToolRequestBuilder};
pub use extract::{
    extract_tool_requests, BlockMarkers, ExtractOptions, Extractor, TracingWarnSink, WarnSink,
    DEFAULT_BLOCK_TAG,
};
pub use request::{ParsedToolRequest, ToolRequestCandidate};
pub use tree::{parse_parameter_tree, NestedParseError, TreeParser, DEFAULT_MAX_NESTING_DEPTH};
pub use validator::validate;
pub use value::{normalize, Node, ParameterTree, Value};
