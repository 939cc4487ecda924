//! Batch extraction of tool-call blocks from model output.
//!
//! A block starts at the opening marker and ends at the nearest following
//! closing marker. A second opening marker before that close does not start
//! a nested block; the first close still ends the outer one.
//!
//! Blocks that fail with a [`ParseFailure`] are reported to the warn sink
//! once each and skipped. Internal errors abort the whole scan.

use memchr::memmem;

use super::builder::{RawBlock, ToolRequestBuilder};
use super::request::ParsedToolRequest;
use super::tree::{TreeParser, DEFAULT_MAX_NESTING_DEPTH};
use crate::error::{ParseFailure, ToolCallError};

/// Tag name of a tool-call block.
pub const DEFAULT_BLOCK_TAG: &str = "use_mcp_tool";

const PREVIEW_CHARS: usize = 120;

// ---------------------------------------------------------------------------
// Warn sink
// ---------------------------------------------------------------------------

/// Receives one human-readable diagnostic per skipped block.
pub trait WarnSink {
    fn warn(&self, message: &str);
}

/// Forwards diagnostics to `tracing::warn!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarnSink;

impl WarnSink for TracingWarnSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

impl<F: Fn(&str)> WarnSink for F {
    fn warn(&self, message: &str) {
        self(message);
    }
}

// ---------------------------------------------------------------------------
// Block markers
// ---------------------------------------------------------------------------

/// Opening and closing markers of a tool-call block.
#[derive(Debug, Clone)]
pub struct BlockMarkers {
    tag: Box<str>,
    open: memmem::Finder<'static>,
    close: memmem::Finder<'static>,
}

impl Default for BlockMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_TAG)
    }
}

impl BlockMarkers {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        Self {
            tag: tag.into(),
            open: memmem::Finder::new(open.as_bytes()).into_owned(),
            close: memmem::Finder::new(close.as_bytes()).into_owned(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Locate every complete block in `text`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::Internal`] if a located block does not fall on
    /// UTF-8 boundaries.
    pub fn find<'a>(&self, text: &'a str) -> Result<Vec<RawBlock<'a>>, ToolCallError> {
        let bytes = text.as_bytes();
        let open_len = self.open.needle().len();
        let close_len = self.close.needle().len();
        let mut blocks = Vec::new();
        let mut cursor = 0usize;

        while let Some(open_rel) = self.open.find(&bytes[cursor..]) {
            let start = cursor + open_rel;
            let body_start = start + open_len;
            let Some(close_rel) = self.close.find(&bytes[body_start..]) else {
                break;
            };
            let body_end = body_start + close_rel;
            let end = body_end + close_len;

            let (Some(block_text), Some(body)) =
                (text.get(start..end), text.get(body_start..body_end))
            else {
                return Err(ToolCallError::Internal(format!(
                    "invalid utf-8 boundary in <{}> block at byte {start}",
                    self.tag
                )));
            };
            blocks.push(RawBlock::new(block_text, body, start));
            cursor = end;
        }

        Ok(blocks)
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Settings for an [`Extractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub block_tag: String,
    pub max_nesting_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            block_tag: DEFAULT_BLOCK_TAG.to_string(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Extracts validated tool requests from free-form text.
#[derive(Debug, Clone)]
pub struct Extractor<S = TracingWarnSink> {
    markers: BlockMarkers,
    builder: ToolRequestBuilder,
    sink: S,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ExtractOptions::default())
    }
}

impl Extractor {
    #[must_use]
    pub fn new(options: &ExtractOptions) -> Self {
        Self::with_sink(options, TracingWarnSink)
    }
}

impl<S: WarnSink> Extractor<S> {
    #[must_use]
    pub fn with_sink(options: &ExtractOptions, sink: S) -> Self {
        Self {
            markers: BlockMarkers::new(&options.block_tag),
            builder: ToolRequestBuilder::new(TreeParser::new(options.max_nesting_depth)),
            sink,
        }
    }

    #[must_use]
    pub fn markers(&self) -> &BlockMarkers {
        &self.markers
    }

    /// Locate the blocks of `text` without building them.
    ///
    /// # Errors
    ///
    /// See [`BlockMarkers::find`].
    pub fn blocks<'a>(&self, text: &'a str) -> Result<Vec<RawBlock<'a>>, ToolCallError> {
        self.markers.find(text)
    }

    /// Build a single block. Parse failures are returned, not logged.
    ///
    /// # Errors
    ///
    /// See [`ToolRequestBuilder::build`].
    pub fn build(&self, block: RawBlock<'_>) -> Result<ParsedToolRequest, ToolCallError> {
        self.builder.build(block)
    }

    /// Extract every valid request from `text`, reporting skipped blocks to
    /// the extractor's own sink.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::Internal`] on a broken invariant; parse
    /// failures never surface here.
    pub fn extract(&self, text: &str) -> Result<Vec<ParsedToolRequest>, ToolCallError> {
        self.extract_with(text, &self.sink)
    }

    /// Like [`Extractor::extract`], reporting skipped blocks to `sink`.
    ///
    /// # Errors
    ///
    /// See [`Extractor::extract`].
    pub fn extract_with<W: WarnSink + ?Sized>(
        &self,
        text: &str,
        sink: &W,
    ) -> Result<Vec<ParsedToolRequest>, ToolCallError> {
        let blocks = self.blocks(text)?;
        build_batch(&self.builder, blocks, sink)
    }
}

/// Builds one located block into a request.
pub(crate) trait BuildBlock {
    fn build_block(&self, block: RawBlock<'_>) -> Result<ParsedToolRequest, ToolCallError>;
}

impl BuildBlock for ToolRequestBuilder {
    fn build_block(&self, block: RawBlock<'_>) -> Result<ParsedToolRequest, ToolCallError> {
        self.build(block)
    }
}

/// Build `blocks` in order. A parse failure is reported to `sink` and the
/// block skipped; any other error stops the batch before later blocks are
/// built.
fn build_batch<B: BuildBlock + ?Sized, W: WarnSink + ?Sized>(
    builder: &B,
    blocks: Vec<RawBlock<'_>>,
    sink: &W,
) -> Result<Vec<ParsedToolRequest>, ToolCallError> {
    let mut requests = Vec::with_capacity(blocks.len());
    let mut skipped = 0usize;

    for block in blocks {
        match builder.build_block(block) {
            Ok(request) => requests.push(request),
            Err(ToolCallError::Parse(failure)) => {
                skipped += 1;
                sink.warn(&describe_skip(&block, &failure));
            }
            Err(err) => return Err(err),
        }
    }

    tracing::debug!(
        "extracted {} tool request(s), skipped {skipped} malformed block(s)",
        requests.len()
    );
    Ok(requests)
}

/// Extract with default markers and limits, logging skips through tracing.
///
/// # Errors
///
/// See [`Extractor::extract`].
pub fn extract_tool_requests(text: &str) -> Result<Vec<ParsedToolRequest>, ToolCallError> {
    Extractor::default().extract(text)
}

fn describe_skip(block: &RawBlock<'_>, failure: &ParseFailure) -> String {
    let raw = failure.raw_text();
    let mut preview: String = raw.chars().take(PREVIEW_CHARS).collect();
    if preview.len() < raw.len() {
        preview.push('…');
    }
    format!(
        "skipping tool-call block at byte {} [{}]: {failure}; block: {preview:?}",
        block.offset(),
        failure.code(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
