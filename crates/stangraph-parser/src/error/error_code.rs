//! Error codes for the stangraph diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Block structure errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Block Structure Errors (E0xx)
    // =========================================================================
    /// Unclosed brace.
    ///
    /// An opening `{` has no matching `}` before the end of the file.
    E001,

    /// Unmatched closing brace.
    ///
    /// A `}` appears outside of any block.
    E002,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unclosed brace",
            ErrorCode::E002 => "unmatched closing brace",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
