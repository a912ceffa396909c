//! Comment-level parsing: unwrapping, the leading description and the tag loop.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::ast::{ParsedComment, Span};
use crate::chars::{is_line_terminator, is_white_space};
use crate::error::Result;
use crate::options::ParseOptions;
use crate::parsers;
use crate::tags::TagParser;

/// Maps byte offsets of the text being parsed back into the comment as written.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Origins {
    /// `table[i]` is the original offset of byte `i`. `None` when the text was not unwrapped.
    table: Option<Vec<usize>>,
    /// Where offsets past the end of the table land: the end of the comment body.
    tail: usize,
}

impl Origins {
    const fn verbatim() -> Self {
        Self {
            table: None,
            tail: 0,
        }
    }

    /// Original offset of the byte at `index`.
    pub(crate) fn start(&self, index: usize) -> usize {
        match &self.table {
            None => index,
            Some(table) => table.get(index).copied().unwrap_or(self.tail),
        }
    }

    /// Original offset for an exclusive end `index`.
    pub(crate) fn end(&self, index: usize) -> usize {
        match &self.table {
            None => index,
            Some(table) => match index.checked_sub(1) {
                Some(last) => table.get(last).map_or(self.tail, |offset| offset + 1),
                None => self.start(0),
            },
        }
    }

    pub(crate) fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.start(start), self.end(end))
    }
}

/// Strips `/**`, `*/`, the leading `*` of every line and trailing whitespace.
///
/// ```
/// assert_eq!(
///     jsdoctor::unwrap_comment("/**\n * Sum.\n *\n * @returns {number}\n */"),
///     "\nSum.\n\n@returns {number}"
/// );
/// ```
pub fn unwrap_comment(comment: &str) -> String {
    unwrap(comment).0
}

fn unwrap(comment: &str) -> (String, Origins) {
    let body_start = parsers::comment_start(comment).map_or(0, |(_, start)| start.len());
    let body_end = if comment[body_start..].ends_with("*/") {
        comment.len() - 2
    } else {
        comment.len()
    };

    let mut text = String::with_capacity(body_end - body_start);
    let mut table = Vec::with_capacity(body_end - body_start);
    let mut pos = body_start;
    while pos < body_end {
        let line = &comment[pos..body_end];
        let content_len = line.find(is_line_terminator).unwrap_or_else(|| line.len());
        let content = &line[..content_len];
        let kept = parsers::line_leading(content).map_or(content, |(rest, _)| rest);
        let kept_start = pos + content.len() - kept.len();
        text.push_str(kept);
        table.extend(kept_start..kept_start + kept.len());

        pos += content_len;
        if let Some(terminator) = line[content_len..].chars().next() {
            text.push(terminator);
            table.extend(pos..pos + terminator.len_utf8());
            pos += terminator.len_utf8();
        }
    }

    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    table.truncate(trimmed);

    let tail = comment
        .strip_suffix("*/")
        .unwrap_or(comment)
        .trim_end()
        .len();
    (
        text,
        Origins {
            table: Some(table),
            tail,
        },
    )
}

/// A position in the text being parsed, with the line it is on.
#[derive(Clone, Debug)]
pub(crate) struct Cursor<'s> {
    source: &'s str,
    index: usize,
    line: usize,
}

impl<'s> Cursor<'s> {
    pub(crate) const fn new(source: &'s str) -> Self {
        Self {
            source,
            index: 0,
            line: 0,
        }
    }

    pub(crate) const fn source(&self) -> &'s str {
        self.source
    }

    pub(crate) const fn index(&self) -> usize {
        self.index
    }

    /// 0-based line of the cursor. `\r\n` counts as one line break.
    pub(crate) const fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn rest(&self) -> &'s str {
        self.source.get(self.index..).unwrap_or_default()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Text between the cursor and `last`.
    pub(crate) fn slice_to(&self, last: usize) -> &'s str {
        self.source.get(self.index..last).unwrap_or_default()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += ch.len_utf8();
        if is_line_terminator(ch) && !(ch == '\r' && self.peek() == Some('\n')) {
            self.line += 1;
        }
        Some(ch)
    }

    /// Consumes characters matching `pred`, stopping at `last`.
    pub(crate) fn bump_while(
        &mut self,
        last: usize,
        mut pred: impl FnMut(char) -> bool,
    ) -> &'s str {
        let start = self.index;
        while self.index < last {
            match self.peek() {
                Some(ch) if pred(ch) => {
                    self.bump();
                }
                _ => break,
            }
        }
        &self.source[start..self.index]
    }

    pub(crate) fn advance_to(&mut self, last: usize) {
        while self.index < last && self.bump().is_some() {}
    }

    fn skip_to_tag(&mut self) -> bool {
        self.bump_while(self.source.len(), |ch| ch != '@');
        self.index < self.source.len()
    }

    /// Consumes `@title` and returns the title.
    fn scan_title(&mut self) -> &'s str {
        match parsers::tag_title(self.rest()) {
            Ok((_, title)) => {
                self.index += 1 + title.len();
                title
            }
            Err(_) => {
                self.bump();
                ""
            }
        }
    }

    /// End of the current tag's content: the next `@` that starts a line, or end of input.
    pub(crate) fn seek_content(&self) -> usize {
        let mut waiting = false;
        let mut chars = self.rest().char_indices().peekable();
        while let Some((offset, ch)) = chars.next() {
            if is_line_terminator(ch) {
                if !(ch == '\r' && matches!(chars.peek(), Some((_, '\n')))) {
                    waiting = true;
                }
            } else if waiting {
                if ch == '@' {
                    return self.index + offset;
                }
                if !is_white_space(ch) {
                    waiting = false;
                }
            }
        }
        self.source.len()
    }

    /// Text up to the first `@` at the start of a line.
    fn scan_description(&mut self, preserve_whitespace: bool) -> String {
        let start = self.index;
        let mut at_allowed = true;
        while let Some(ch) = self.peek() {
            if at_allowed && ch == '@' {
                break;
            }
            if is_line_terminator(ch) {
                at_allowed = true;
            } else if at_allowed && !is_white_space(ch) {
                at_allowed = false;
            }
            self.bump();
        }

        let description = &self.source[start..self.index];
        if preserve_whitespace {
            description.to_owned()
        } else {
            description.trim().to_owned()
        }
    }
}

/// Parses a doc comment into its leading description and tags.
///
/// # Examples
///
/// ```
/// use jsdoctor::{parse, ParseOptions};
///
/// let comment = parse(
///     "/**\n * @param {string} name - the name\n * @returns {boolean} ok\n */",
///     &ParseOptions { unwrap: true, ..ParseOptions::default() },
/// )?;
///
/// assert_eq!(comment.tags.len(), 2);
/// assert_eq!(comment.tags[0].name.as_deref(), Some("name"));
/// assert_eq!(comment.tags[0].description.as_deref(), Some("the name"));
/// assert_eq!(comment.tags[1].title, "returns");
/// # Ok::<(), jsdoctor::Error>(())
/// ```
///
/// # Errors
///
/// Fails on malformed type expressions inside tags, and on any tag-level problem when
/// `options.policy` is [`ErrorPolicy::Strict`](crate::ErrorPolicy::Strict).
pub fn parse(comment: &str, options: &ParseOptions) -> Result<ParsedComment> {
    let (text, origins) = if options.unwrap {
        let (text, origins) = unwrap(comment);
        (Cow::Owned(text), origins)
    } else {
        (Cow::Borrowed(comment), Origins::verbatim())
    };

    let mut cursor = Cursor::new(&text);
    let description = cursor.scan_description(options.preserve_whitespace);

    let mut tags = Vec::new();
    while cursor.skip_to_tag() {
        let title = cursor.scan_title();
        match TagParser::new(&mut cursor, &origins, options, title).parse()? {
            Some(tag) if options.keeps(&tag.title) => tags.push(tag),
            Some(tag) => trace!(title = %tag.title, "tag filtered out"),
            None => debug!(title, line = cursor.line(), "tag dropped"),
        }
    }

    Ok(ParsedComment { description, tags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Tag, TypeNode};
    use crate::options::ErrorPolicy;

    #[test]
    fn test_unwrap() {
        assert_eq!(unwrap_comment("/** foo */"), "foo");
        assert_eq!(unwrap_comment("/* foo */"), "foo");
        assert_eq!(
            unwrap_comment("/**\n * a\n *   b\n *\n\t* c\n */"),
            "\na\n  b\n\nc"
        );
        assert_eq!(unwrap_comment("no delimiters"), "no delimiters");
        assert_eq!(unwrap_comment("/**\r\n * a\r\n */"), "\r\na");
        assert_eq!(unwrap_comment("/**/"), "/");
    }

    #[test]
    fn test_unwrap_origins() {
        let comment = "/**\n * @param {string} x\n */";
        let (text, origins) = unwrap(comment);
        assert_eq!(text, "\n@param {string} x");

        let at = text.find('@').unwrap();
        assert_eq!(&comment[origins.start(at)..], "@param {string} x\n */");
        assert_eq!(origins.end(text.len()), comment.find("x\n").unwrap() + 1);
        assert_eq!(origins.start(text.len() + 5), comment.find("x\n").unwrap() + 1);
    }

    #[test]
    fn test_cursor_lines() {
        let mut cursor = Cursor::new("a\r\nb\nc\rd");
        cursor.advance_to(8);
        assert_eq!(cursor.line(), 3);
        assert_eq!(cursor.bump(), None);
    }

    #[test]
    fn test_seek_content() {
        let cursor = Cursor::new("{x} a@b\n  c\n  @next");
        assert_eq!(cursor.seek_content(), 14);

        let cursor = Cursor::new("text with no tags");
        assert_eq!(cursor.seek_content(), 17);
    }

    #[test]
    fn test_description() {
        let comment = parse(
            "  Leading text, mail@example.com\n  more\n@returns {x}",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(comment.description, "Leading text, mail@example.com\n  more");
        assert_eq!(comment.tags.len(), 1);

        let comment = parse(
            "  padded  \n@returns {x}",
            &ParseOptions {
                preserve_whitespace: true,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert_eq!(comment.description, "  padded  \n");
    }

    #[test]
    fn test_unwrapped_comment() {
        let comment = parse(
            "/**\n * @param {string} name - the name\n * @returns {boolean} ok\n */",
            &ParseOptions {
                unwrap: true,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert_eq!(comment.description, "");
        assert_eq!(
            comment.tags,
            vec![
                Tag {
                    name: Some("name".to_owned()),
                    ty: Some(TypeNode::name("string")),
                    description: Some("the name".to_owned()),
                    ..Tag::new("param")
                },
                Tag {
                    ty: Some(TypeNode::name("boolean")),
                    description: Some("ok".to_owned()),
                    ..Tag::new("returns")
                },
            ]
        );
    }

    #[test]
    fn test_line_numbers_and_filter() {
        let comment = parse(
            "/**\n * Intro.\n *\n * @param {a} x\n * @since 1.0\n * @param {b} y\n */",
            &ParseOptions {
                unwrap: true,
                line_numbers: true,
                tags: Some(vec!["param".to_owned()]),
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert_eq!(comment.description, "Intro.");
        let lines: Vec<_> = comment.tags.iter().map(|tag| tag.line_number).collect();
        assert_eq!(lines, vec![Some(3), Some(5)]);
    }

    #[test]
    fn test_ranges_point_into_the_original() {
        let source = "/**\n * @param {Array.<string>} x\n */";
        let comment = parse(
            source,
            &ParseOptions {
                unwrap: true,
                range: true,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        let tag = &comment.tags[0];
        let range = tag.range.unwrap();
        assert_eq!(&source[range.start..range.end], "@param {Array.<string>} x");
        let ty = tag.ty.as_ref().unwrap().range.unwrap();
        assert_eq!(&source[ty.start..ty.end], "Array.<string>");
    }

    #[test]
    fn test_multiline_type_ranges() {
        let source = "/**\n * @param {{a: number,\n *   b: string}} x\n */";
        let comment = parse(
            source,
            &ParseOptions {
                unwrap: true,
                range: true,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        let ty = comment.tags[0].ty.as_ref().unwrap().range.unwrap();
        assert_eq!(&source[ty.start..ty.end], "{a: number,\n *   b: string}");
        assert_eq!(comment.tags[0].name.as_deref(), Some("x"));
    }

    #[test]
    fn test_dropped_tag_does_not_stop_parsing() {
        let comment = parse(
            "@access weird\n@returns {x} ok",
            &ParseOptions {
                policy: ErrorPolicy::Lenient,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert_eq!(comment.tags.len(), 1);
        assert_eq!(comment.tags[0].title, "returns");
    }

    #[test]
    fn test_empty_title() {
        let comment = parse(
            "@ orphan\n@returns {x}",
            &ParseOptions {
                policy: ErrorPolicy::LenientCollecting,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert_eq!(comment.tags[0].title, "");
        assert_eq!(comment.tags[0].errors, vec!["Missing or invalid title"]);
        assert_eq!(comment.tags[1].title, "returns");
    }
}
