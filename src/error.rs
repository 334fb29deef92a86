// Error handling for templet

use std::fmt;
use thiserror::Error;

/// Classification of a [`TemplateError`], retrievable from a template after
/// a failed compile or render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownTag,
    UnclosedTag,
    UnknownFilter,
    TagSyntax,
    Syntax,
    Filter,
    Lookup,
    RecursionLimit,
    Io,
    Registry,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnknownTag => "UnknownTagError",
            ErrorKind::UnclosedTag => "UnclosedTagError",
            ErrorKind::UnknownFilter => "UnknownFilterError",
            ErrorKind::TagSyntax => "TagSyntaxError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Filter => "FilterError",
            ErrorKind::Lookup => "LookupError",
            ErrorKind::RecursionLimit => "RecursionLimitError",
            ErrorKind::Io => "IOError",
            ErrorKind::Registry => "RegistryError",
        };
        f.write_str(name)
    }
}

/// Template compile and render error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown tag '{tag}' on line {line}")]
    UnknownTag { tag: String, line: usize },

    #[error("unclosed tag '{tag}' opened on line {line}")]
    UnclosedTag { tag: String, line: usize },

    #[error("unknown filter '{name}'")]
    UnknownFilter { name: String },

    #[error("invalid '{tag}' tag: {message}")]
    TagSyntax { tag: String, message: String },

    #[error("syntax error on line {line}: {message}")]
    Syntax { message: String, line: usize },

    #[error("filter '{filter}' failed: {message}")]
    Filter { filter: String, message: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("recursion limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} '{name}' is already registered")]
    DuplicateName { kind: &'static str, name: String },
}

impl TemplateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TemplateError::UnknownTag { .. } => ErrorKind::UnknownTag,
            TemplateError::UnclosedTag { .. } => ErrorKind::UnclosedTag,
            TemplateError::UnknownFilter { .. } => ErrorKind::UnknownFilter,
            TemplateError::TagSyntax { .. } => ErrorKind::TagSyntax,
            TemplateError::Syntax { .. } => ErrorKind::Syntax,
            TemplateError::Filter { .. } => ErrorKind::Filter,
            TemplateError::Lookup(_) => ErrorKind::Lookup,
            TemplateError::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            TemplateError::Io(_) => ErrorKind::Io,
            TemplateError::DuplicateName { .. } => ErrorKind::Registry,
        }
    }

    /// Shorthand used by tag factories for malformed argument text.
    pub fn tag_syntax(tag: &str, message: impl Into<String>) -> Self {
        TemplateError::TagSyntax {
            tag: tag.to_string(),
            message: message.into(),
        }
    }
}

/// Raised by a filter when its input or argument has the wrong shape.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct FilterError(String);

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A variable path that could not be resolved against a context.
///
/// Never fatal during rendering: variable output degrades to an empty string
/// and conditions treat it as false.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not resolve '{step}' in '{path}'")]
pub struct LookupError {
    pub path: String,
    pub step: String,
}

pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = TemplateError::UnknownTag {
            tag: "frobnicate".to_string(),
            line: 1,
        };
        assert_eq!(err.kind(), ErrorKind::UnknownTag);
        assert_eq!(err.to_string(), "unknown tag 'frobnicate' on line 1");

        let err = TemplateError::tag_syntax("now", "expected a quoted format string");
        assert_eq!(err.kind(), ErrorKind::TagSyntax);
        assert!(err.to_string().contains("'now'"));
    }

    #[test]
    fn test_lookup_error_converts() {
        let err: TemplateError = LookupError {
            path: "user.name".to_string(),
            step: "name".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.to_string(), "could not resolve 'name' in 'user.name'");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::UnclosedTag.to_string(), "UnclosedTagError");
        assert_eq!(ErrorKind::Registry.to_string(), "RegistryError");
    }
}
