/// How tag-level problems (missing names, invalid enum values, trailing content) are treated.
///
/// Structural errors in type expressions that cannot be recovered from, such as unbalanced
/// braces, abort the parse under every policy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ErrorPolicy {
    /// The first tag-level error aborts the parse.
    Strict,
    /// A tag with an error is dropped; parsing continues with the next tag.
    #[default]
    Lenient,
    /// Errors are collected on the tag and the tag is kept.
    LenientCollecting,
}

impl ErrorPolicy {
    /// Maps the `strict` / `recoverable` flag pair onto a policy. `strict` wins.
    pub const fn from_flags(strict: bool, recoverable: bool) -> Self {
        if strict {
            Self::Strict
        } else if recoverable {
            Self::LenientCollecting
        } else {
            Self::Lenient
        }
    }
}

/// Options for [`parse`](crate::parse).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ParseOptions {
    /// Strip `/**`, `*/` and the leading `*` of every line first.
    pub unwrap: bool,
    /// Accept `[name=default]` names on `@param` and `@property` tags.
    pub sloppy: bool,
    pub policy: ErrorPolicy,
    pub line_numbers: bool,
    /// Attach source ranges to tags and type nodes.
    pub range: bool,
    /// Only keep tags with these titles. Other tags are still parsed.
    pub tags: Option<Vec<String>>,
    /// Keep the leading description untrimmed.
    pub preserve_whitespace: bool,
}

impl ParseOptions {
    /// Wants a tag titled `title` in the output.
    pub(crate) fn keeps(&self, title: &str) -> bool {
        self.tags
            .as_ref()
            .map_or(true, |tags| tags.iter().any(|t| t == title))
    }
}

/// Options for the type expression entry points.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct TypeOptions {
    pub range: bool,
    /// Added to every range.
    pub start_index: usize,
}

/// Options for [`stringify`](crate::stringify).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct StringifyOptions {
    /// Omit optional spaces, e.g. `function(a,b):c` instead of `function (a, b): c`.
    pub compact: bool,
    /// Render an outermost union without parentheses.
    pub top_level: bool,
}
