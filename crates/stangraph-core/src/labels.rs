//! Display labels for variables.
//!
//! A label file maps variable names to the text shown for them in rendered
//! graphs. Each non-empty line holds exactly two whitespace-separated tokens:
//!
//! ```text
//! mu      μ
//! sigma   σ
//! ```

use std::str::FromStr;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::identifier::Id;

/// Errors raised while reading a label mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// A line does not consist of exactly two tokens.
    #[error("line {line}: expected `name label`, found {tokens} token(s) in `{content}`")]
    Format {
        /// 1-based line number.
        line: usize,
        content: String,
        tokens: usize,
    },
}

/// Mapping from variable name to display label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMapping {
    labels: IndexMap<Id, String>,
}

impl LabelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses label file content.
    ///
    /// Blank lines are skipped; a later line for the same name wins.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::Format`] for the first line that does not have
    /// exactly two tokens.
    ///
    /// ```
    /// use stangraph_core::{identifier::Id, labels::LabelMapping};
    ///
    /// let labels = LabelMapping::parse("mu μ\n\nsigma σ\n").unwrap();
    /// assert_eq!(labels.get(Id::new("mu")), Some("μ"));
    /// assert_eq!(labels.len(), 2);
    /// ```
    pub fn parse(content: &str) -> Result<Self, LabelError> {
        let mut labels = Self::new();

        for (index, line) in content.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [] => continue,
                [name, label] => {
                    labels.insert(Id::new(name), *label);
                }
                _ => {
                    return Err(LabelError::Format {
                        line: index + 1,
                        content: line.trim().to_string(),
                        tokens: tokens.len(),
                    });
                }
            }
        }

        debug!(labels = labels.len(); "Label mapping parsed");
        Ok(labels)
    }

    pub fn insert(&mut self, name: Id, label: impl Into<String>) -> Option<String> {
        self.labels.insert(name, label.into())
    }

    pub fn get(&self, name: Id) -> Option<&str> {
        self.labels.get(&name).map(String::as_str)
    }

    /// The label for `name`, falling back to the name itself.
    pub fn display_name(&self, name: Id) -> String {
        self.get(name)
            .map_or_else(|| name.to_string(), str::to_string)
    }

    /// Names that have a label.
    pub fn names(&self) -> impl Iterator<Item = Id> + '_ {
        self.labels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromStr for LabelMapping {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let labels = LabelMapping::parse("alpha intercept\n  beta   slope  \n").unwrap();

        assert_eq!(labels.get(Id::new("alpha")), Some("intercept"));
        assert_eq!(labels.get(Id::new("beta")), Some("slope"));
    }

    #[test]
    fn test_later_line_wins() {
        let labels = LabelMapping::parse("mu a\nmu b\n").unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get(Id::new("mu")), Some("b"));
    }

    #[test]
    fn test_display_name_fallback() {
        let labels = LabelMapping::parse("mu μ").unwrap();
        assert_eq!(labels.display_name(Id::new("mu")), "μ");
        assert_eq!(labels.display_name(Id::new("tau")), "tau");
    }

    #[test]
    fn test_one_token_is_error() {
        let err = LabelMapping::parse("mu μ\nsigma\n").unwrap_err();
        assert_eq!(
            err,
            LabelError::Format {
                line: 2,
                content: "sigma".to_string(),
                tokens: 1,
            }
        );
    }

    #[test]
    fn test_three_tokens_is_error() {
        let err: LabelError = "a b c".parse::<LabelMapping>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1: expected `name label`, found 3 token(s) in `a b c`"
        );
    }

    #[test]
    fn test_empty_content() {
        let labels = LabelMapping::parse("\n   \n").unwrap();
        assert!(labels.is_empty());
    }
}
