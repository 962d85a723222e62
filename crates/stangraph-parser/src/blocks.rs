//! Block extraction.
//!
//! A Stan program is a sequence of named top-level regions such as
//! `data { ... }` or `transformed parameters { ... }`. This module splits
//! comment-free source text into those regions with a brace depth counter.
//! Braces nested inside a block (loops, conditionals, local scopes) are part
//! of its body and are skipped as a whole.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    lexical::is_word_char,
    span::Span,
};

/// A named top-level region of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    name: String,
    body: String,
    name_span: Span,
    body_span: Span,
}

impl Block {
    /// Block name with its words separated by single spaces.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text strictly between the opening brace and its matching closing brace.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Location of the name as written in the source.
    pub fn name_span(&self) -> Span {
        self.name_span
    }

    /// Location of the body in the source.
    pub fn body_span(&self) -> Span {
        self.body_span
    }
}

/// Finds the `}` that balances the `{` at `open`.
fn find_matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, byte) in bytes[open + 1..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + 1 + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads the block name that ends right before the brace at `open`.
///
/// The name is the longest run of whitespace-separated words directly in
/// front of the brace, looking no further back than `from`. Returns `None`
/// when the brace is not preceded by a word.
fn block_header(text: &str, from: usize, open: usize) -> Option<(String, Span)> {
    let head = text[from..open].trim_end();
    let end = from + head.len();

    let run_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c) || c.is_whitespace())
        .last()
        .map(|(index, _)| index)?;

    let run = &head[run_start..];
    let start = end - run.trim_start().len();

    let name = text[start..end].split_whitespace().collect::<Vec<_>>().join(" ");
    Some((name, Span::new(start..end)))
}

/// Splits comment-free source text into its named top-level blocks.
///
/// Blocks are returned in order of first appearance. A repeated name
/// replaces the earlier body but keeps the earlier position. A brace region
/// without a name is skipped.
///
/// # Errors
///
/// Returns a [`ParseError`] holding every brace problem of the text:
/// [`ErrorCode::E001`] for an opening brace that is never closed and
/// [`ErrorCode::E002`] for a closing brace outside of any block.
pub fn extract_blocks(text: &str) -> Result<IndexMap<String, Block>, ParseError> {
    let bytes = text.as_bytes();
    let mut collector = DiagnosticCollector::new();
    let mut blocks: IndexMap<String, Block> = IndexMap::new();

    // Start of the text that may hold the next block header.
    let mut header_from = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {
                let header = block_header(text, header_from, pos);

                let Some(close) = find_matching_close(bytes, pos) else {
                    let mut diagnostic = Diagnostic::error(ErrorCode::E001.description())
                        .with_code(ErrorCode::E001)
                        .with_label(Span::new(pos..pos + 1), "this `{` is never closed");
                    if let Some((name, name_span)) = &header {
                        diagnostic = diagnostic
                            .with_secondary_label(*name_span, format!("in block `{name}`"));
                    }
                    collector.emit(
                        diagnostic.with_help("add a matching `}` at the end of the block"),
                    );
                    break;
                };

                match header {
                    Some((name, name_span)) => {
                        let body_span = Span::new(pos + 1..close);
                        let block = Block {
                            name: name.clone(),
                            body: text[body_span.range()].to_string(),
                            name_span,
                            body_span,
                        };
                        trace!(block = name, body_span = body_span.to_string(); "Block found");
                        if blocks.insert(name.clone(), block).is_some() {
                            warn!(block = name; "Repeated block name, later body replaces earlier one");
                        }
                    }
                    None => {
                        warn!(offset = pos; "Skipping brace region without a block name");
                    }
                }

                pos = close + 1;
                header_from = pos;
            }
            b'}' => {
                collector.emit(
                    Diagnostic::error(ErrorCode::E002.description())
                        .with_code(ErrorCode::E002)
                        .with_label(Span::new(pos..pos + 1), "this `}` closes no block")
                        .with_help("remove it or add the missing `{`"),
                );
                pos += 1;
                header_from = pos;
            }
            _ => pos += 1,
        }
    }

    collector.finish()?;

    debug!(blocks = blocks.len(); "Blocks extracted");
    Ok(blocks)
}
