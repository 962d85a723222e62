//! Declaration scanning.
//!
//! Recognizes typed variable declarations such as `real mu;`,
//! `vector<lower=0>[K] sigma;` or `array[N] int<lower=0, upper=1> y;` and
//! collects the declared names. The recognizer works on single lines: a
//! declaration split across lines is not seen.

use indexmap::{IndexMap, IndexSet};
use log::trace;
use winnow::{
    Parser as _,
    combinator::{opt, repeat},
    token::take_till,
};

use stangraph_core::{declared::DeclaredSet, identifier::Id};

use crate::{
    blocks::Block,
    lexical::{IResult, word, word_starts, ws1},
};

/// Type keywords that start a declaration.
const TYPE_KEYWORDS: &[&str] = &[
    "int",
    "real",
    "complex",
    "vector",
    "row_vector",
    "matrix",
    "array",
    "simplex",
    "ordered",
    "positive_ordered",
    "unit_vector",
    "sum_to_zero_vector",
    "cov_matrix",
    "corr_matrix",
    "cholesky_factor_cov",
    "cholesky_factor_corr",
    "complex_vector",
    "complex_row_vector",
    "complex_matrix",
];

fn type_keyword<'src>(input: &mut &'src str) -> IResult<&'src str> {
    word.verify(|w: &str| TYPE_KEYWORDS.contains(&w))
        .parse_next(input)
}

/// `<lower=0, upper=1>`, up to the first `>`.
fn constraint<'src>(input: &mut &'src str) -> IResult<&'src str> {
    ('<', take_till(0.., '>'), '>').take().parse_next(input)
}

/// `[N, K]`, up to the first `]`.
fn size<'src>(input: &mut &'src str) -> IResult<&'src str> {
    ('[', take_till(0.., ']'), ']').take().parse_next(input)
}

/// One type component followed by whitespace, e.g. `array[N] `.
fn type_component(input: &mut &str) -> IResult<()> {
    (type_keyword, opt(constraint), opt(size), ws1)
        .void()
        .parse_next(input)
}

/// A declaration prefix; yields the declared name.
fn declaration<'src>(input: &mut &'src str) -> IResult<&'src str> {
    let () = repeat(1.., type_component).parse_next(input)?;
    word.parse_next(input)
}

/// The name declared on `line`, if the line holds a declaration.
///
/// The first declaration found on the line wins.
fn line_declaration(line: &str) -> Option<&str> {
    word_starts(line).find_map(|start| declaration(&mut &line[start..]).ok())
}

/// Names declared in `text`, in first-declaration order.
///
/// ```
/// use stangraph_parser::scan_declarations;
///
/// let names = scan_declarations("int<lower=0> N;\narray[N] vector[K] y;\nreal mu;");
/// assert_eq!(names, vec!["N", "y", "mu"]);
/// ```
pub fn scan_declarations(text: &str) -> Vec<&str> {
    text.lines()
        .filter_map(line_declaration)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Scans every block and builds the set of declared names.
///
/// All blocks are scanned before any statement is parsed, so a name used in
/// a block before the block that declares it still resolves.
pub fn declared_set(blocks: &IndexMap<String, Block>) -> DeclaredSet {
    let mut declared = DeclaredSet::new();
    for block in blocks.values() {
        for name in scan_declarations(block.body()) {
            if !declared.insert(Id::new(name), block.name()) {
                trace!(name, block = block.name(); "Name declared again");
            }
        }
    }
    declared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_declarations() {
        assert_eq!(line_declaration("real mu;"), Some("mu"));
        assert_eq!(line_declaration("  int N;"), Some("N"));
        assert_eq!(line_declaration("complex z;"), Some("z"));
    }

    #[test]
    fn test_constrained_and_sized() {
        assert_eq!(line_declaration("real<lower=0> sigma;"), Some("sigma"));
        assert_eq!(line_declaration("vector<lower=0>[K] tau;"), Some("tau"));
        assert_eq!(
            line_declaration("matrix<lower=-1, upper=1>[N, K] X;"),
            Some("X")
        );
        assert_eq!(line_declaration("cholesky_factor_corr[K] L;"), Some("L"));
    }

    #[test]
    fn test_compound_keywords_take_last_identifier() {
        assert_eq!(line_declaration("array[N] int<lower=0, upper=1> y;"), Some("y"));
        assert_eq!(line_declaration("array[J] vector[K] beta;"), Some("beta"));
    }

    #[test]
    fn test_old_array_syntax() {
        assert_eq!(line_declaration("real y[N];"), Some("y"));
    }

    #[test]
    fn test_declaration_with_initializer() {
        assert_eq!(line_declaration("real lp = 0;"), Some("lp"));
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert_eq!(line_declaration("integer = 5;"), None);
        assert_eq!(line_declaration("my_real x;"), None);
        assert_eq!(line_declaration("realx y;"), None);
    }

    #[test]
    fn test_declaration_after_other_text() {
        assert_eq!(line_declaration("for (n in 1:N) { real tmp;"), Some("tmp"));
    }

    #[test]
    fn test_non_declarations() {
        assert_eq!(line_declaration("y ~ normal(mu, sigma);"), None);
        assert_eq!(line_declaration(""), None);
        assert_eq!(line_declaration("real"), None);
        assert_eq!(line_declaration("real;"), None);
    }

    #[test]
    fn test_first_declaration_on_line_wins() {
        assert_eq!(line_declaration("real a; real b;"), Some("a"));
    }

    #[test]
    fn test_scan_deduplicates() {
        let names = scan_declarations("real a;\nreal b;\nreal a;\n");
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_declared_set_records_first_block() {
        let blocks = crate::blocks::extract_blocks(
            "data { int N; vector[N] y; }\nparameters { real mu; }\nmodel { real mu; }",
        )
        .unwrap();

        let declared = declared_set(&blocks);
        assert_eq!(declared.len(), 2);
        assert_eq!(declared.block_of(Id::new("N")), Some("data"));
        assert_eq!(declared.block_of(Id::new("mu")), Some("parameters"));
        // One declaration per line: `y` shares a line with `N`.
        assert!(!declared.contains(Id::new("y")));
    }
}
