use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyPath,
    EmptyVersion,
    UnsafeCharacters,
    PathTraversal,
    InvalidPathFormat,
    InvalidVersionFormat,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyPath => "EMPTY_PATH",
            Self::EmptyVersion => "EMPTY_VERSION",
            Self::UnsafeCharacters => "UNSAFE_CHARACTERS",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::InvalidPathFormat => "INVALID_PATH_FORMAT",
            Self::InvalidVersionFormat => "INVALID_VERSION_FORMAT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected user input. `Security` marks input that looked like an injection
/// or traversal attempt rather than a plain typo.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{message}")]
    Validation {
        code: ErrorCode,
        message: String,
        suggestions: Vec<String>,
    },

    #[error("{message}")]
    Security {
        code: ErrorCode,
        message: String,
        suggestions: Vec<String>,
    },
}

impl InputError {
    pub(crate) fn validation(
        code: ErrorCode,
        message: impl Into<String>,
        suggestions: &[&str],
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            suggestions: suggestions.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub(crate) fn security(code: ErrorCode, message: impl Into<String>, suggestions: &[&str]) -> Self {
        Self::Security {
            code,
            message: message.into(),
            suggestions: suggestions.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } | Self::Security { code, .. } => *code,
        }
    }

    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Validation { suggestions, .. } | Self::Security { suggestions, .. } => {
                suggestions
            }
        }
    }

    #[must_use]
    pub fn is_security(&self) -> bool {
        matches!(self, Self::Security { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, InputError};

    #[test]
    fn codes_render_as_screaming_snake_case() {
        assert_eq!(ErrorCode::PathTraversal.to_string(), "PATH_TRAVERSAL");
        assert_eq!(
            ErrorCode::InvalidVersionFormat.as_str(),
            "INVALID_VERSION_FORMAT"
        );
    }

    #[test]
    fn accessors_work_for_both_kinds() {
        let security = InputError::security(
            ErrorCode::UnsafeCharacters,
            "bad",
            &["use a standard path"],
        );
        let validation = InputError::validation(ErrorCode::EmptyPath, "empty", &["give a path"]);

        assert!(security.is_security());
        assert!(!validation.is_security());
        assert_eq!(security.code(), ErrorCode::UnsafeCharacters);
        assert_eq!(validation.suggestions(), ["give a path".to_string()]);
        assert_eq!(security.to_string(), "bad");
    }
}
