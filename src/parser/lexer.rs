// Lexical helpers shared by the filter parsers

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till, take_till1},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, not, peek, recognize},
    multi::many0_count,
    number::complete::double,
    sequence::{delimited, pair, terminated},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare identifier: letter or underscore, then letters, digits, underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Backtick-quoted identifier for column names with spaces: `Account Type`
pub fn quoted_identifier(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('`'), take_till1(|c| c == '`'), char('`')),
        |s: &str| s.trim().to_string(),
    )(input)
}

/// Double-quoted string literal (no escapes)
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Case-insensitive keyword that must not run into an identifier
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(kw), not(peek(alt((alphanumeric1, tag("_"))))))
}
