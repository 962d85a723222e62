//! Error types for stangraph operations.
//!
//! This module provides the main error type [`StangraphError`] which wraps
//! the error conditions of every stage: reading input, parsing, squishing,
//! rendering and exporting.

use std::io;

use thiserror::Error;

use stangraph_core::{GraphError, LabelError};
use stangraph_parser::error::ParseError;

use crate::render::RenderError;

/// The main error type for stangraph operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the structured
/// [`ParseError`], so callers can print the diagnostics with their source
/// snippets.
#[derive(Debug, Error)]
pub enum StangraphError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Label file error: {0}")]
    Labels(#[from] LabelError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StangraphError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
