use thiserror::Error;

/// Everything that can go wrong while parsing a comment or a type expression.
///
/// Structural errors (`UnterminatedString`, `UnbalancedBraces`, `UnexpectedToken`, ...)
/// come from the type grammar. The capitalised variants are tag-level problems; their
/// messages are the ones collected in [`Tag::errors`](crate::ast::Tag::errors).
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("unterminated string literal at offset {position}")]
    UnterminatedString { position: usize },

    #[error("Braces are not balanced")]
    UnbalancedBraces,

    #[error("{message} at offset {position}")]
    UnexpectedToken { position: usize, message: String },

    #[error("unexpected end of input at offset {position}")]
    UnexpectedEndOfInput { position: usize },

    #[error("optional parameter must be followed by optional parameters at offset {position}")]
    InvalidOptionalSequence { position: usize },

    #[error("type expression does not reach end of input at offset {position}")]
    NotAtEndOfInput { position: usize },

    #[error("type expression nested deeper than {limit} levels")]
    TooDeeplyNested { limit: usize },

    #[error("Missing or invalid title")]
    MissingOrInvalidTitle,

    #[error("Missing or invalid tag name")]
    MissingOrInvalidName,

    #[error("Missing or invalid tag type")]
    MissingOrInvalidType,

    #[error("Invalid name for this")]
    InvalidThis,

    #[error("Unknown content '{0}'")]
    UnknownContent(String),

    #[error("Invalid kind name '{0}'")]
    InvalidKind(String),

    #[error("Invalid access name '{0}'")]
    InvalidAccess(String),

    #[error("Invalid variation '{0}'")]
    InvalidVariation(String),
}

impl Error {
    pub(crate) fn unexpected(position: usize, message: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            position,
            message: message.into(),
        }
    }

    /// Whether the error must abort the whole parse, even where other type errors are
    /// recovered from (optional tag types, speculative `function` parsing).
    pub(crate) const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedString { .. }
                | Self::UnbalancedBraces
                | Self::TooDeeplyNested { .. }
                | Self::InvalidOptionalSequence { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
