//! Error and diagnostic system for the stangraph parser.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - A diagnostic collector for reporting every problem of a file at once
//!
//! The parser is deliberately permissive: only structural problems that make
//! the block layout of a model ambiguous are errors. Lines that the heuristic
//! recognizers do not understand are skipped silently.
//!
//! # Example
//!
//! ```
//! # use stangraph_parser::error::{Diagnostic, ErrorCode};
//! # use stangraph_parser::Span;
//!
//! let diag = Diagnostic::error("unclosed brace")
//!     .with_code(ErrorCode::E001)
//!     .with_label(Span::new(6..7), "this `{` is never closed")
//!     .with_secondary_label(Span::new(0..5), "in block `model`")
//!     .with_help("add a matching `}`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
