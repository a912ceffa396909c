//! Small nom parsers for the lexical pieces of a doc comment: delimiters, line leaders,
//! tag titles and numeric literals.

use nom::bytes::complete::{tag, take_while};
use nom::character::complete::{
    alphanumeric0, char, digit0, digit1, hex_digit1, oct_digit1, one_of, satisfy,
};
use nom::combinator::{opt, recognize, verify};
use nom::error::{context, VerboseError};
use nom::sequence::{pair, preceded, tuple};
use nom::{IResult, Parser};

use crate::chars::is_white_space;

type PResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Eats the comment start sequence, `/**` or `/*`.
pub fn comment_start(i: &str) -> PResult<'_, &str> {
    context("comment_start", recognize(pair(tag("/*"), opt(char('*'))))).parse(i)
}

/// Eats a single comment line leading, i.e. ` * `. Only one space after the star is eaten.
pub fn line_leading(i: &str) -> PResult<'_, &str> {
    context(
        "line_leading",
        recognize(pair(
            take_while(is_white_space),
            opt(pair(char('*'), opt(satisfy(is_white_space)))),
        )),
    )
    .parse(i)
}

/// Eats `@` and returns the alphanumeric title after it, which may be empty.
pub fn tag_title(i: &str) -> PResult<'_, &str> {
    context("tag_title", preceded(char('@'), alphanumeric0)).parse(i)
}

pub fn hex_literal(i: &str) -> PResult<'_, &str> {
    context(
        "hex_literal",
        recognize(tuple((char('0'), one_of("xX"), hex_digit1))),
    )
    .parse(i)
}

pub fn octal_literal(i: &str) -> PResult<'_, &str> {
    context("octal_literal", recognize(pair(char('0'), oct_digit1))).parse(i)
}

/// `12`, `1.5`, `.5`, `1.`, `3e-4`. At least one digit is required.
pub fn decimal_literal(i: &str) -> PResult<'_, &str> {
    context(
        "decimal_literal",
        verify(
            recognize(tuple((
                digit0,
                opt(pair(char('.'), digit0)),
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
            |s: &str| s.bytes().any(|b| b.is_ascii_digit()),
        ),
    )
    .parse(i)
}

/// A decimal literal with an optional sign, as accepted by `@variation`.
pub fn signed_decimal(i: &str) -> PResult<'_, &str> {
    context(
        "signed_decimal",
        recognize(pair(opt(one_of("+-")), decimal_literal)),
    )
    .parse(i)
}

#[cfg(test)]
mod tests {
    use nom::error::{ErrorKind, VerboseErrorKind};
    use nom::Err as NomErr;

    use super::*;

    #[test]
    fn test_comment_start() {
        assert_eq!(comment_start("/**"), Ok(("", "/**")));
        assert_eq!(comment_start("/* x"), Ok((" x", "/*")));
        assert_eq!(
            comment_start("//"),
            Err(NomErr::Error(VerboseError {
                errors: vec![
                    ("//", VerboseErrorKind::Nom(ErrorKind::Tag)),
                    ("//", VerboseErrorKind::Context("comment_start"))
                ]
            }))
        );
    }

    #[test]
    fn test_line_leading() {
        assert_eq!(line_leading(" * text"), Ok(("text", " * ")));
        assert_eq!(line_leading(" *  text"), Ok((" text", " * ")));
        assert_eq!(line_leading("*"), Ok(("", "*")));
        assert_eq!(line_leading("\t\ttext"), Ok(("text", "\t\t")));
        assert_eq!(line_leading("\n * "), Ok(("\n * ", "")));
    }

    #[test]
    fn test_tag_title() {
        assert_eq!(tag_title("@param {x}"), Ok((" {x}", "param")));
        assert_eq!(tag_title("@returns"), Ok(("", "returns")));
        assert_eq!(tag_title("@ x"), Ok((" x", "")));
        assert_eq!(
            tag_title("param"),
            Err(NomErr::Error(VerboseError {
                errors: vec![
                    ("param", VerboseErrorKind::Char('@')),
                    ("param", VerboseErrorKind::Context("tag_title"))
                ]
            }))
        );
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(hex_literal("0xFFz"), Ok(("z", "0xFF")));
        assert!(hex_literal("0x").is_err());
        assert_eq!(octal_literal("017)"), Ok((")", "017")));
        assert_eq!(decimal_literal("12|"), Ok(("|", "12")));
        assert_eq!(decimal_literal("1.5e3,"), Ok((",", "1.5e3")));
        assert_eq!(decimal_literal(".5"), Ok(("", ".5")));
        assert_eq!(decimal_literal("2e"), Ok(("e", "2")));
        assert!(decimal_literal(".").is_err());
        assert_eq!(signed_decimal("-1.5 rest"), Ok((" rest", "-1.5")));
    }
}
