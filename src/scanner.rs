//! Tokenizer for type expressions.
//!
//! [`next_token`] classifies the token starting at (or after whitespace following) a byte
//! offset. [`Scanner`] keeps the current token and can be snapshotted for backtracking.

use crate::chars::{
    is_identifier_start, is_line_terminator, is_octal_digit, is_type_name, is_white_space,
};
use crate::error::{Error, Result};
use crate::parsers;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Illegal,
    /// `.<`
    DotLt,
    /// `...`
    Rest,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    Comma,
    Colon,
    Star,
    Pipe,
    Question,
    Bang,
    Equal,
    Name,
    String,
    Number,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    None,
    /// A name, or the decoded contents of a string literal.
    Text(String),
    Number(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    /// Byte offset of the first character of the token.
    pub start: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

impl Token {
    const fn simple(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            value: TokenValue::None,
            start,
            end,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this is a name token spelled `name`.
    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text() == Some(name)
    }
}

const fn punctuator(ch: char) -> Option<TokenKind> {
    Some(match ch {
        ':' => TokenKind::Colon,
        ',' => TokenKind::Comma,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBrack,
        ']' => TokenKind::RBrack,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '*' => TokenKind::Star,
        '|' => TokenKind::Pipe,
        '?' => TokenKind::Question,
        '!' => TokenKind::Bang,
        '=' => TokenKind::Equal,
        _ => return None,
    })
}

/// Scans the token at `index`, skipping any whitespace and line terminators before it.
///
/// # Errors
///
/// Fails on unterminated string literals and malformed numbers.
pub fn next_token(source: &str, index: usize) -> Result<Token> {
    let rest = source.get(index..).unwrap_or_default();
    let skipped = rest
        .find(|ch: char| !is_white_space(ch) && !is_line_terminator(ch))
        .unwrap_or_else(|| rest.len());
    let index = index + skipped;

    let ch = match rest[skipped..].chars().next() {
        Some(ch) => ch,
        None => return Ok(Token::simple(TokenKind::Eof, index, index)),
    };

    if let Some(kind) = punctuator(ch) {
        return Ok(Token::simple(kind, index, index + 1));
    }
    match ch {
        '"' | '\'' => scan_string(source, index),
        '.' => scan_dot(source, index),
        '0'..='9' => scan_number(source, index),
        _ => Ok(scan_type_name(source, index)),
    }
}

fn scan_dot(source: &str, index: usize) -> Result<Token> {
    let rest = &source[index..];
    if rest.starts_with(".<") {
        Ok(Token::simple(TokenKind::DotLt, index, index + 2))
    } else if rest.starts_with("...") {
        Ok(Token::simple(TokenKind::Rest, index, index + 3))
    } else if rest[1..].starts_with(|ch: char| ch.is_ascii_digit()) {
        scan_number(source, index)
    } else {
        Ok(Token::simple(TokenKind::Illegal, index, index + 1))
    }
}

fn radix_value(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|ch| ch.to_digit(radix))
        .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(digit))
}

fn scan_number(source: &str, index: usize) -> Result<Token> {
    let rest = &source[index..];
    let invalid = |_| Error::unexpected(index, "invalid number literal");

    let (remaining, value) = if rest.starts_with("0x") || rest.starts_with("0X") {
        let (remaining, text) = parsers::hex_literal(rest).map_err(invalid)?;
        (remaining, radix_value(&text[2..], 16))
    } else if rest.starts_with('0') && rest[1..].starts_with(is_octal_digit) {
        let (remaining, text) = parsers::octal_literal(rest).map_err(invalid)?;
        if remaining.starts_with(|ch: char| ch.is_ascii_digit()) {
            return Err(Error::unexpected(
                source.len() - remaining.len(),
                "invalid octal literal",
            ));
        }
        (remaining, radix_value(&text[1..], 8))
    } else if rest.starts_with('0') && rest[1..].starts_with(|ch: char| ch.is_ascii_digit()) {
        return Err(Error::unexpected(index + 1, "invalid number literal"));
    } else {
        let (remaining, text) = parsers::decimal_literal(rest).map_err(invalid)?;
        let value = text
            .parse::<f64>()
            .map_err(|_| Error::unexpected(index, "invalid number literal"))?;
        (remaining, value)
    };

    let end = source.len() - remaining.len();
    if remaining.starts_with(is_identifier_start) {
        return Err(Error::unexpected(end, "identifier directly after number"));
    }
    Ok(Token {
        kind: TokenKind::Number,
        value: TokenValue::Number(value),
        start: index,
        end,
    })
}

fn scan_string(source: &str, index: usize) -> Result<Token> {
    let unterminated = Error::UnterminatedString { position: index };
    let mut chars = source[index..].char_indices();
    let quote = match chars.next() {
        Some((_, quote)) => quote,
        None => return Err(unterminated),
    };
    let mut value = String::new();

    loop {
        let (offset, ch) = chars.next().ok_or_else(|| unterminated.clone())?;
        if ch == quote {
            return Ok(Token {
                kind: TokenKind::String,
                value: TokenValue::Text(value),
                start: index,
                end: index + offset + ch.len_utf8(),
            });
        }
        if is_line_terminator(ch) {
            return Err(unterminated);
        }
        if ch != '\\' {
            value.push(ch);
            continue;
        }

        let (_, escaped) = chars.next().ok_or_else(|| unterminated.clone())?;
        match escaped {
            '\r' => {
                if chars.clone().next().map(|(_, ch)| ch) == Some('\n') {
                    chars.next();
                }
            }
            ch if is_line_terminator(ch) => {}
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            'x' | 'u' => {
                let len = if escaped == 'u' { 4 } else { 2 };
                let mut lookahead = chars.clone();
                let code = (0..len).try_fold(0_u32, |code, _| {
                    lookahead
                        .next()
                        .and_then(|(_, ch)| ch.to_digit(16))
                        .map(|digit| code * 16 + digit)
                });
                match code.and_then(char::from_u32) {
                    Some(ch) => {
                        value.push(ch);
                        chars = lookahead;
                    }
                    None => value.push(escaped),
                }
            }
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or_default();
                let max_digits = if escaped <= '3' { 3 } else { 2 };
                for _ in 1..max_digits {
                    match chars.clone().next().and_then(|(_, ch)| ch.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                value.extend(char::from_u32(code));
            }
            other => value.push(other),
        }
    }
}

fn scan_type_name(source: &str, index: usize) -> Token {
    let rest = &source[index..];
    let mut end = rest.len();

    for (offset, ch) in rest.char_indices().skip(1) {
        if !is_type_name(ch) {
            end = offset;
            break;
        }
        if ch == '.' {
            match rest[offset + 1..].chars().next() {
                None => return Token::simple(TokenKind::Illegal, index, index + offset + 1),
                Some('<') => {
                    end = offset;
                    break;
                }
                Some(_) => {}
            }
        }
    }

    Token {
        kind: TokenKind::Name,
        value: TokenValue::Text(rest[..end].to_owned()),
        start: index,
        end: index + end,
    }
}

/// Saved scanner state for backtracking.
#[derive(Clone, Debug, PartialEq)]
pub struct ScannerState {
    token: Token,
    previous: usize,
}

/// Pulls tokens out of a type expression one at a time.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    source: &'a str,
    /// The current, not yet consumed, token.
    token: Token,
    /// End offset of the last consumed token.
    previous: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner positioned on the first token of `source`.
    ///
    /// # Errors
    ///
    /// Fails if the first token cannot be scanned.
    pub fn new(source: &'a str) -> Result<Self> {
        Ok(Self {
            source,
            token: next_token(source, 0)?,
            previous: 0,
        })
    }

    pub const fn source(&self) -> &'a str {
        self.source
    }

    #[inline]
    pub const fn token(&self) -> &Token {
        &self.token
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    /// End offset of the last consumed token.
    #[inline]
    pub const fn previous_end(&self) -> usize {
        self.previous
    }

    /// Consumes the current token and scans the next one.
    ///
    /// # Errors
    ///
    /// Fails if the next token cannot be scanned.
    pub fn advance(&mut self) -> Result<Token> {
        let next = next_token(self.source, self.token.end)?;
        self.previous = self.token.end;
        Ok(std::mem::replace(&mut self.token, next))
    }

    pub fn snapshot(&self) -> ScannerState {
        ScannerState {
            token: self.token.clone(),
            previous: self.previous,
        }
    }

    pub fn restore(&mut self, state: ScannerState) {
        self.token = state.token;
        self.previous = state.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scans every token of `source` up to end of input.
    fn scan_all(source: &str) -> Result<Vec<Token>> {
        let mut scanner = Scanner::new(source)?;
        let mut tokens = Vec::new();
        while scanner.kind() != TokenKind::Eof {
            tokens.push(scanner.advance()?);
        }
        Ok(tokens)
    }

    fn scan_kinds(source: &str) -> Vec<TokenKind> {
        scan_all(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn single(source: &str) -> Token {
        next_token(source, 0).unwrap()
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(scan_kinds("").is_empty());
        assert!(scan_kinds(" \t\n\u{3000}\r\n").is_empty());
        assert_eq!(single("   ").kind, TokenKind::Eof);
        assert_eq!(single("   ").start, 3);
    }

    #[test]
    fn test_punctuation() {
        use TokenKind::*;
        assert_eq!(
            scan_kinds("<>(){}[],:*|?!="),
            vec![
                Lt, Gt, LParen, RParen, LBrace, RBrace, LBrack, RBrack, Comma, Colon, Star, Pipe,
                Question, Bang, Equal
            ]
        );
    }

    #[test]
    fn test_dot_forms() {
        use TokenKind::*;
        assert_eq!(scan_kinds("Array.<string>"), vec![Name, DotLt, Name, Gt]);
        assert_eq!(scan_kinds("...number"), vec![Rest, Name]);
        assert_eq!(single(".5").value, TokenValue::Number(0.5));
        assert_eq!(single(".x").kind, Illegal);
        assert_eq!(single("..x").kind, Illegal);
    }

    #[test]
    fn test_names() {
        let token = single("  a.b.c#d~e|");
        assert_eq!(token.kind, TokenKind::Name);
        assert_eq!(token.text(), Some("a.b.c#d~e"));
        assert_eq!((token.start, token.end), (2, 11));

        assert_eq!(single("module").text(), Some("module"));
        assert_eq!(single("Foo.").kind, TokenKind::Illegal);
        assert_eq!(single("ünïcode").text(), Some("ünïcode"));
        assert!(single("function").is_name("function"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(single("42").value, TokenValue::Number(42.0));
        assert_eq!(single("3.25").value, TokenValue::Number(3.25));
        assert_eq!(single("1e3").value, TokenValue::Number(1000.0));
        assert_eq!(single("2E-1").value, TokenValue::Number(0.2));
        assert_eq!(single("0xff").value, TokenValue::Number(255.0));
        assert_eq!(single("017").value, TokenValue::Number(15.0));
        assert_eq!(single("0").value, TokenValue::Number(0.0));
        assert_eq!(single("12|").end, 2);
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(
            next_token("09", 0),
            Err(Error::UnexpectedToken { position: 1, .. })
        ));
        assert!(matches!(
            next_token("0x", 0),
            Err(Error::UnexpectedToken { .. })
        ));
        assert!(matches!(
            next_token("018", 0),
            Err(Error::UnexpectedToken { .. })
        ));
        assert!(matches!(
            next_token("12abc", 0),
            Err(Error::UnexpectedToken { position: 2, .. })
        ));
    }

    #[test]
    fn test_strings() {
        let token = single(r#""hello" rest"#);
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.text(), Some("hello"));
        assert_eq!(token.end, 7);

        assert_eq!(single("'it''s'").text(), Some("it"));
        assert_eq!(single(r#""a\tb\nc""#).text(), Some("a\tb\nc"));
        assert_eq!(single(r#""\x41B""#).text(), Some("AB"));
        assert_eq!(single(r#""\101\7""#).text(), Some("A\u{7}"));
        assert_eq!(single("\"a\\\nb\"").text(), Some("ab"));
        assert_eq!(single("\"a\\\r\nb\"").text(), Some("ab"));
        assert_eq!(single(r#""\q""#).text(), Some("q"));
    }

    #[test]
    fn test_malformed_escapes_degrade() {
        assert_eq!(single(r#""\xZZ""#).text(), Some("xZZ"));
        assert_eq!(single(r#""\u12""#).text(), Some("u12"));
    }

    #[test]
    fn test_unterminated_strings() {
        assert_eq!(
            next_token("  'abc", 0),
            Err(Error::UnterminatedString { position: 2 })
        );
        assert_eq!(
            next_token("\"ab\ncd\"", 0),
            Err(Error::UnterminatedString { position: 0 })
        );
        assert_eq!(
            next_token("\"ab\\", 0),
            Err(Error::UnterminatedString { position: 0 })
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let mut scanner = Scanner::new("function(a)").unwrap();
        let state = scanner.snapshot();
        scanner.advance().unwrap();
        scanner.advance().unwrap();
        assert_eq!(scanner.kind(), TokenKind::Name);
        assert_eq!(scanner.previous_end(), 9);

        scanner.restore(state);
        assert!(scanner.token().is_name("function"));
        assert_eq!(scanner.previous_end(), 0);
    }
}
