//! Per-tag grammars.
//!
//! Every title maps to a fixed sequence of [`Step`]s. Each step consumes part of the tag's
//! content and fills in fields of the [`Tag`]; a step that returns `false` drops the tag.

use tracing::{debug, trace};

use crate::ast::{Span, Tag, TypeKind, TypeNode};
use crate::chars::{is_identifier_part, is_identifier_start, is_line_terminator, is_white_space};
use crate::comment::{Cursor, Origins};
use crate::error::{Error, Result};
use crate::options::{ErrorPolicy, ParseOptions, TypeOptions};
use crate::parsers;
use crate::types::{parse_param_type, parse_type};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    Type,
    Name,
    NamePath,
    NamePathOptional,
    Description,
    Caption,
    Kind,
    Access,
    This,
    Variation,
    EnsureEnd,
    Epilogue,
}

/// Steps for a lower-cased title.
fn rules(title: &str) -> &'static [Step] {
    match title {
        "access" => &[Step::Access],
        "kind" => &[Step::Kind],
        "variation" => &[Step::Variation],
        "example" => &[Step::Caption],
        "alias" | "mixes" | "name" | "requires" => &[Step::NamePath, Step::EnsureEnd],
        "augments" | "class" | "constructor" | "extends" | "member" | "module" | "namespace"
        | "var" => &[Step::Type, Step::NamePathOptional, Step::EnsureEnd],
        "func" | "function" | "method" | "mixin" => &[Step::NamePathOptional, Step::EnsureEnd],
        "deprecated" | "since" | "summary" | "todo" | "version" => &[Step::Description],
        "private" | "protected" | "public" => &[Step::Type, Step::Description],
        "global" | "inner" | "instance" | "readonly" | "static" => &[Step::EnsureEnd],
        "this" => &[Step::This, Step::EnsureEnd],
        "typedef" => &[Step::Type, Step::NamePathOptional],
        _ => &[Step::Type, Step::Name, Step::Description, Step::Epilogue],
    }
}

const KINDS: &[&str] = &[
    "class",
    "constant",
    "event",
    "external",
    "file",
    "function",
    "member",
    "mixin",
    "module",
    "namespace",
    "typedef",
];

const ACCESS_LEVELS: &[&str] = &["private", "protected", "public"];

fn is_param_title(title: &str) -> bool {
    matches!(title, "param" | "argument" | "arg")
}

fn is_return_title(title: &str) -> bool {
    matches!(title, "return" | "returns")
}

fn is_property_title(title: &str) -> bool {
    matches!(title, "property" | "prop")
}

fn is_name_required(title: &str) -> bool {
    is_param_title(title)
        || is_property_title(title)
        || matches!(title, "alias" | "this" | "mixes" | "requires")
}

fn is_name_allowed(title: &str) -> bool {
    is_name_required(title) || matches!(title, "const" | "constant")
}

/// Titles whose names may be dotted paths and `[name=default]` forms.
fn is_param_like(title: &str) -> bool {
    is_param_title(title) || is_property_title(title)
}

fn is_type_required(title: &str) -> bool {
    is_param_like(title)
        || is_return_title(title)
        || matches!(title, "define" | "enum" | "implements" | "this" | "type" | "typedef")
}

fn is_type_allowed(title: &str) -> bool {
    is_type_required(title)
        || matches!(
            title,
            "throws"
                | "const"
                | "constant"
                | "namespace"
                | "member"
                | "var"
                | "module"
                | "constructor"
                | "class"
                | "extends"
                | "augments"
                | "public"
                | "private"
                | "protected"
        )
}

fn is_blank(ch: char) -> bool {
    is_white_space(ch) || is_line_terminator(ch)
}

/// Reads an identifier. Digits are accepted in first position.
fn scan_identifier<'s>(cursor: &mut Cursor<'s>, last: usize) -> Option<&'s str> {
    let start = cursor.index();
    match cursor.peek() {
        Some(ch) if start < last && (is_identifier_start(ch) || ch.is_ascii_digit()) => {
            cursor.bump();
        }
        _ => return None,
    }
    cursor.bump_while(last, is_identifier_part);
    cursor.source().get(start..cursor.index())
}

/// Parses one tag, starting just after its title.
pub(crate) struct TagParser<'p, 's> {
    cursor: &'p mut Cursor<'s>,
    origins: &'p Origins,
    options: &'p ParseOptions,
    /// Lower-cased title used for rule lookup.
    title: String,
    tag: Tag,
    /// Offset of the `@`.
    first: usize,
    /// End of the tag's content.
    last: usize,
    /// A type that stood in for a missing parameter name.
    extra_name: Option<TypeNode>,
}

impl<'p, 's> TagParser<'p, 's> {
    pub(crate) fn new(
        cursor: &'p mut Cursor<'s>,
        origins: &'p Origins,
        options: &'p ParseOptions,
        title: &str,
    ) -> Self {
        let mut tag = Tag::new(title);
        if options.line_numbers {
            tag.line_number = Some(cursor.line());
        }
        let first = cursor.index().saturating_sub(title.len() + 1);
        let last = cursor.index();
        Self {
            cursor,
            origins,
            options,
            title: title.to_ascii_lowercase(),
            tag,
            first,
            last,
            extra_name: None,
        }
    }

    /// Runs the steps for the title and leaves the cursor at the end of the tag.
    ///
    /// Returns `None` when a step dropped the tag.
    pub(crate) fn parse(mut self) -> Result<Option<Tag>> {
        let kept = self.run()?;
        self.cursor.advance_to(self.last);
        Ok(if kept { Some(self.tag) } else { None })
    }

    fn run(&mut self) -> Result<bool> {
        if self.title.is_empty() && !self.add_error(Error::MissingOrInvalidTitle)? {
            return Ok(false);
        }

        self.last = self.cursor.seek_content();
        if self.options.range {
            let content_end = self
                .cursor
                .source()
                .get(..self.last)
                .unwrap_or_default()
                .trim_end()
                .len();
            self.tag.range = Some(self.origins.span(self.first, content_end));
        }

        let steps = rules(&self.title);
        trace!(title = %self.tag.title, ?steps, "parsing tag");
        for &step in steps {
            let proceed = match step {
                Step::Type => self.parse_type(),
                Step::Name => self.parse_name(),
                Step::NamePath => self.parse_name_path(false),
                Step::NamePathOptional => self.parse_name_path(true),
                Step::Description => self.parse_description(),
                Step::Caption => self.parse_caption(),
                Step::Kind => self.parse_kind(),
                Step::Access => self.parse_access(),
                Step::This => self.parse_this(),
                Step::Variation => self.parse_variation(),
                Step::EnsureEnd => self.ensure_end(),
                Step::Epilogue => self.epilogue(),
            }?;
            if !proceed {
                trace!(title = %self.tag.title, ?step, "tag stopped");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Records a tag-level error. Returns whether parsing of the tag continues.
    fn add_error(&mut self, err: Error) -> Result<bool> {
        match self.options.policy {
            ErrorPolicy::Strict => Err(err),
            policy => {
                debug!(title = %self.tag.title, %err, "tag error");
                self.tag.errors.push(err.to_string());
                Ok(policy == ErrorPolicy::LenientCollecting)
            }
        }
    }

    /// The rest of the tag's content, trimmed.
    fn remaining(&self) -> &'s str {
        self.cursor.slice_to(self.last).trim()
    }

    fn parse_type(&mut self) -> Result<bool> {
        if is_type_required(&self.title) {
            self.tag.ty = self.scan_type()?;
            if self.tag.ty.is_none()
                && !is_param_title(&self.title)
                && !is_return_title(&self.title)
            {
                return self.add_error(Error::MissingOrInvalidType);
            }
        } else if is_type_allowed(&self.title) {
            match self.scan_type() {
                Ok(ty) => self.tag.ty = ty,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => trace!(%err, "ignoring invalid optional type"),
            }
        }
        Ok(true)
    }

    /// Reads a `{...}` type, if the content starts with one.
    fn scan_type(&mut self) -> Result<Option<TypeNode>> {
        let last = self.last;
        self.cursor.bump_while(last, is_white_space);
        if self.cursor.index() >= last || self.cursor.peek() != Some('{') {
            return Ok(None);
        }
        self.cursor.bump();

        let mut depth = 1_usize;
        let mut text = String::new();
        // Offset of every byte of `text` in the cursor's source.
        let mut offsets = Vec::new();
        while self.cursor.index() < last {
            let index = self.cursor.index();
            let ch = match self.cursor.bump() {
                Some(ch) => ch,
                None => break,
            };
            if is_line_terminator(ch) {
                continue;
            }
            if ch == '}' {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if ch == '{' {
                depth += 1;
            }
            text.push(ch);
            offsets.extend(index..index + ch.len_utf8());
        }
        if depth != 0 {
            return Err(Error::UnbalancedBraces);
        }

        let options = TypeOptions {
            range: self.options.range,
            start_index: 0,
        };
        let mut ty = if is_param_like(&self.title) {
            parse_param_type(&text, options)?
        } else {
            parse_type(&text, options)?
        };

        if self.options.range {
            let origins = self.origins;
            ty.map_ranges(&mut |span: Span| {
                let start = offsets
                    .get(span.start)
                    .map_or_else(|| origins.end(last), |&index| origins.start(index));
                let end = span
                    .end
                    .checked_sub(1)
                    .and_then(|end| offsets.get(end))
                    .map_or_else(|| origins.end(last), |&index| origins.end(index + 1));
                Span::new(start, end)
            });
        }
        Ok(Some(ty))
    }

    /// Reads a name, a dotted path or a bracketed `[name=default]`.
    fn scan_name(&mut self, allow_brackets: bool, allow_nested: bool) -> Option<String> {
        let last = self.last;
        let cursor = &mut *self.cursor;

        cursor.bump_while(last, is_blank);
        if cursor.index() >= last {
            return None;
        }

        let mut name = String::new();
        let bracketed = cursor.peek() == Some('[');
        if bracketed {
            if !allow_brackets {
                return None;
            }
            cursor.bump();
            name.push('[');
        }

        name.push_str(scan_identifier(cursor, last)?);

        if allow_nested {
            if cursor.peek() == Some(':')
                && matches!(name.as_str(), "module" | "external" | "event")
            {
                cursor.bump();
                name.push(':');
                name.push_str(scan_identifier(cursor, last).unwrap_or_default());
            }
            if cursor.rest().starts_with("[]") {
                cursor.bump();
                cursor.bump();
                name.push_str("[]");
            }
            while cursor.index() < last
                && matches!(cursor.peek(), Some('.' | '/' | '#' | '-' | '~'))
            {
                name.extend(cursor.bump());
                name.push_str(scan_identifier(cursor, last).unwrap_or_default());
            }
        }

        if bracketed {
            cursor.bump_while(last, is_blank);
            if cursor.peek() == Some('=') {
                cursor.bump();
                name.push('=');
                cursor.bump_while(last, is_blank);

                let mut depth = 1_usize;
                let mut quote = None;
                while cursor.index() < last {
                    let ch = match cursor.peek() {
                        Some(ch) => ch,
                        None => break,
                    };
                    if quote.is_none() && is_blank(ch) {
                        cursor.bump();
                        continue;
                    }
                    match (ch, quote) {
                        ('\'' | '"', None) => quote = Some(ch),
                        (_, Some(open)) if ch == open => quote = None,
                        ('[', None) => depth += 1,
                        (']', None) => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    name.push(ch);
                    cursor.bump();
                }
            }

            cursor.bump_while(last, is_blank);
            if cursor.index() >= last || cursor.peek() != Some(']') {
                return None;
            }
            cursor.bump();
            name.push(']');
        }

        Some(name)
    }

    fn parse_name(&mut self) -> Result<bool> {
        if !is_name_allowed(&self.title) {
            return Ok(true);
        }

        let allow_brackets = self.options.sloppy && is_param_like(&self.title);
        match self.scan_name(allow_brackets, is_param_like(&self.title)) {
            None => {
                if !is_name_required(&self.title) {
                    return Ok(true);
                }
                let type_name = self
                    .tag
                    .ty
                    .as_ref()
                    .and_then(TypeNode::as_name)
                    .map(str::to_owned);
                match type_name {
                    Some(name) if is_param_title(&self.title) => {
                        self.extra_name = self.tag.ty.take();
                        self.tag.name = Some(name);
                    }
                    _ => return self.add_error(Error::MissingOrInvalidName),
                }
            }
            Some(name) => {
                match name.strip_prefix('[').and_then(|name| name.strip_suffix(']')) {
                    Some(inner) => {
                        let mut parts = inner.splitn(2, '=');
                        self.tag.name = parts.next().map(str::to_owned);
                        self.tag.default = parts.next().map(str::to_owned);
                        self.tag.ty = self.tag.ty.take().map(|ty| {
                            if ty.is_optional() {
                                ty
                            } else {
                                TypeNode::optional(ty)
                            }
                        });
                    }
                    None => self.tag.name = Some(name),
                }
            }
        }
        Ok(true)
    }

    fn parse_name_path(&mut self, optional: bool) -> Result<bool> {
        let allow_brackets = self.options.sloppy && is_param_like(&self.title);
        let name = self.scan_name(allow_brackets, true);
        if name.is_none() && !optional && !self.add_error(Error::MissingOrInvalidName)? {
            return Ok(false);
        }
        self.tag.name = name;
        Ok(true)
    }

    fn parse_description(&mut self) -> Result<bool> {
        let description = self.remaining();
        if !description.is_empty() {
            let description = match description.strip_prefix('-') {
                Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
                _ => description,
            };
            self.tag.description = Some(description.to_owned());
        }
        Ok(true)
    }

    fn parse_caption(&mut self) -> Result<bool> {
        const OPEN: &str = "<caption>";
        const CLOSE: &str = "</caption>";

        let description = self.remaining();
        match (description.find(OPEN), description.find(CLOSE)) {
            (Some(open), Some(close)) if open + OPEN.len() <= close => {
                self.tag.caption = Some(description[open + OPEN.len()..close].trim().to_owned());
                self.tag.description =
                    Some(description[close + CLOSE.len()..].trim().to_owned());
            }
            _ => self.tag.description = Some(description.to_owned()),
        }
        Ok(true)
    }

    fn parse_kind(&mut self) -> Result<bool> {
        let kind = self.remaining();
        self.tag.kind = Some(kind.to_owned());
        if KINDS.contains(&kind) {
            Ok(true)
        } else {
            self.add_error(Error::InvalidKind(kind.to_owned()))
        }
    }

    fn parse_access(&mut self) -> Result<bool> {
        let access = self.remaining();
        self.tag.access = Some(access.to_owned());
        if ACCESS_LEVELS.contains(&access) {
            Ok(true)
        } else {
            self.add_error(Error::InvalidAccess(access.to_owned()))
        }
    }

    fn parse_this(&mut self) -> Result<bool> {
        if !self.remaining().starts_with('{') {
            return self.parse_name_path(false);
        }

        let proceed = self.parse_type()?;
        let name = match self.tag.ty.as_ref().map(|ty| &ty.kind) {
            Some(TypeKind::NameExpression { name }) => Some(Some(name.clone())),
            Some(TypeKind::UnionType { .. }) => Some(None),
            _ => None,
        };
        match name {
            Some(name) if proceed => {
                self.tag.name = name;
                Ok(true)
            }
            _ => self.add_error(Error::InvalidThis),
        }
    }

    fn parse_variation(&mut self) -> Result<bool> {
        let text = self.remaining();
        let variation = parsers::signed_decimal(text)
            .ok()
            .and_then(|(_, number)| number.parse::<f64>().ok());
        self.tag.variation = variation;
        if variation.is_some() {
            Ok(true)
        } else {
            self.add_error(Error::InvalidVariation(text.to_owned()))
        }
    }

    fn ensure_end(&mut self) -> Result<bool> {
        let rest = self.remaining();
        if rest.is_empty() {
            Ok(true)
        } else {
            self.add_error(Error::UnknownContent(rest.to_owned()))
        }
    }

    /// `@param {T} [name]` without sloppy mode leaves the bracket in the description.
    ///
    /// A name that was borrowed from the type is given back: the type is restored and the
    /// tag ends up with no name, so `@param {foo} [bar]` has type `foo` and `name: None`.
    fn epilogue(&mut self) -> Result<bool> {
        let bracketed = self
            .tag
            .description
            .as_deref()
            .map_or(false, |description| description.starts_with('['));
        if is_param_like(&self.title) && self.tag.ty.is_none() && bracketed {
            if let Some(ty) = self.extra_name.take() {
                self.tag.ty = Some(ty);
                self.tag.name = None;
            }
            if !self.options.sloppy {
                return self.add_error(Error::MissingOrInvalidName);
            }
        }
        Ok(true)
    }
}
