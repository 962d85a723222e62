//! Comment stripping.
//!
//! Removes `//` line comments and `/* */` block comments from model source.
//! Every removed character is replaced by blanks of the same byte length and
//! newlines inside block comments are kept, so the result has the same
//! length and line structure as the input and spans stay valid for the
//! original file.

use winnow::{
    Parser as _,
    combinator::{alt, terminated},
    token::{rest, take_till, take_until, take_while},
};

use crate::lexical::IResult;

/// A run of source text classified by the comment scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'src> {
    Code(&'src str),
    Comment(&'src str),
}

/// Parse a line comment, up to but not including the newline.
fn line_comment<'src>(input: &mut &'src str) -> IResult<&'src str> {
    ("//", take_while(0.., |c: char| c != '\n'))
        .take()
        .parse_next(input)
}

/// Parse a block comment; an unterminated one runs to the end of input.
fn block_comment<'src>(input: &mut &'src str) -> IResult<&'src str> {
    (
        "/*",
        alt((terminated(take_until(0.., "*/"), "*/"), rest)),
    )
        .take()
        .parse_next(input)
}

/// Parse code up to the next `/`, or a lone `/` that starts no comment.
fn code<'src>(input: &mut &'src str) -> IResult<&'src str> {
    alt((take_till(1.., '/'), "/")).parse_next(input)
}

fn piece<'src>(input: &mut &'src str) -> IResult<Piece<'src>> {
    alt((
        line_comment.map(Piece::Comment),
        block_comment.map(Piece::Comment),
        code.map(Piece::Code),
    ))
    .parse_next(input)
}

/// Appends blanks standing in for `comment`, keeping its line breaks.
fn blank_out(comment: &str, out: &mut String) {
    for c in comment.chars() {
        match c {
            '\n' | '\r' => out.push(c),
            _ => out.extend(std::iter::repeat_n(' ', c.len_utf8())),
        }
    }
}

/// Returns `source` with all comments blanked out.
///
/// ```
/// use stangraph_parser::strip_comments;
///
/// let text = strip_comments("real mu; // location\n/* block */ real sigma;");
/// assert_eq!(text, "real mu;            \n            real sigma;");
/// ```
pub fn strip_comments(source: &str) -> String {
    let mut input = source;
    let mut out = String::with_capacity(source.len());

    while !input.is_empty() {
        match piece(&mut input) {
            Ok(Piece::Code(text)) => out.push_str(text),
            Ok(Piece::Comment(text)) => blank_out(text, &mut out),
            Err(_) => {
                // Every input starts one of the alternatives; keep the rest
                // verbatim should that ever change.
                out.push_str(input);
                break;
            }
        }
    }

    out
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Source-like text mixing code, comment markers and line breaks.
    fn source_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            prop_oneof![
                "[a-z ;=~(){}]{0,8}",
                Just("//".to_string()),
                Just("/*".to_string()),
                Just("*/".to_string()),
                Just("\n".to_string()),
                Just("μ".to_string()),
            ],
            0..24,
        )
        .prop_map(|pieces| pieces.concat())
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Stripping keeps the byte length and every line break.
    fn check_length_and_lines_preserved(source: &str) -> Result<(), TestCaseError> {
        let stripped = strip_comments(source);

        prop_assert_eq!(stripped.len(), source.len());
        let newlines = |s: &str| s.match_indices('\n').map(|(i, _)| i).collect::<Vec<_>>();
        prop_assert_eq!(newlines(&stripped), newlines(source));
        Ok(())
    }

    /// Stripping twice changes nothing more.
    fn check_idempotent(source: &str) -> Result<(), TestCaseError> {
        let once = strip_comments(source);
        let twice = strip_comments(&once);

        prop_assert_eq!(once, twice);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn length_and_lines_preserved(source in source_strategy()) {
            check_length_and_lines_preserved(&source)?;
        }

        #[test]
        fn idempotent(source in source_strategy()) {
            check_idempotent(&source)?;
        }
    }
}
