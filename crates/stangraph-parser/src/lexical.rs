//! Lexical helpers shared by the line recognizers.

use winnow::{
    Parser as _,
    error::{ContextError, ErrMode},
    token::take_while,
};

pub(crate) type IResult<O> = Result<O, ErrMode<ContextError>>;

/// Characters of an identifier-like word: letters, digits and `_`.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse one word.
pub(crate) fn word<'src>(input: &mut &'src str) -> IResult<&'src str> {
    take_while(1.., is_word_char).parse_next(input)
}

/// Parse a run of whitespace, possibly empty.
pub(crate) fn ws0<'src>(input: &mut &'src str) -> IResult<&'src str> {
    take_while(0.., char::is_whitespace).parse_next(input)
}

/// Parse a non-empty run of whitespace.
pub(crate) fn ws1<'src>(input: &mut &'src str) -> IResult<&'src str> {
    take_while(1.., char::is_whitespace).parse_next(input)
}

/// Maximal word runs of `text`, in order.
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|token| !token.is_empty())
}

/// Byte offsets at which a word starts.
pub(crate) fn word_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut in_word = false;
    text.char_indices().filter_map(move |(index, c)| {
        let is_word = is_word_char(c);
        let starts = is_word && !in_word;
        in_word = is_word;
        starts.then_some(index)
    })
}
