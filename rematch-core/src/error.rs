//! Error types for the regex engine
//!
//! Every failure the engine can report happens while parsing a pattern.
//! Matching itself has no error path: a search either finds a match or
//! it does not.

use thiserror::Error;

/// The kind of problem found in a pattern.
///
/// The `Display` text of each code is the short message shown to users,
/// e.g. `missing closing )`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unexpected inconsistency inside the parser
    #[error("regexp/syntax: internal error")]
    InternalError,

    /// Unknown POSIX class name or a malformed class
    #[error("invalid character class")]
    InvalidCharClass,

    /// Reversed range like `[z-a]`, or an unknown class name
    #[error("invalid character class range")]
    InvalidCharRange,

    /// Unknown or malformed escape sequence
    #[error("invalid escape sequence")]
    InvalidEscape,

    /// Malformed `(?P<name>` group
    #[error("invalid named capture")]
    InvalidNamedCapture,

    /// Malformed or unsupported `(?` construct
    #[error("invalid or unsupported Perl syntax")]
    InvalidPerlOp,

    /// Stacked repetition operators such as `a**`
    #[error("invalid nested repetition operator")]
    InvalidRepeatOp,

    /// Repeat count out of range, or nested counts that multiply too far
    #[error("invalid repeat count")]
    InvalidRepeatSize,

    /// Pattern bytes are not valid UTF-8
    #[error("invalid UTF-8")]
    InvalidUtf8,

    /// Character class without its closing `]`
    #[error("missing closing ]")]
    MissingBracket,

    /// Group without its closing `)`
    #[error("missing closing )")]
    MissingParen,

    /// Repetition operator with nothing to repeat
    #[error("missing argument to repetition operator")]
    MissingRepeatArgument,

    /// Pattern ends with a lone backslash
    #[error("trailing backslash at end of expression")]
    TrailingBackslash,

    /// `)` without a matching `(`
    #[error("unexpected )")]
    UnexpectedParen,

    /// Expression tree nested deeper than the parser allows
    #[error("expression nests too deeply")]
    NestingDepth,

    /// Expression would compile to too large a program
    #[error("expression too large")]
    Large,
}

/// An error found while parsing a pattern
///
/// `expr` holds the offending piece of the pattern. For size and depth
/// errors it is the whole pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error parsing regexp: {code}: `{expr}`")]
pub struct ParseError {
    /// What went wrong
    pub code: ErrorCode,
    /// The offending text
    pub expr: String,
}

impl ParseError {
    /// Create a new error for the given piece of the pattern
    pub fn new(code: ErrorCode, expr: impl Into<String>) -> Self {
        ParseError {
            code,
            expr: expr.into(),
        }
    }
}

/// Result type alias for pattern compilation
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::MissingParen.to_string(), "missing closing )");
        assert_eq!(
            ErrorCode::InvalidRepeatOp.to_string(),
            "invalid nested repetition operator"
        );
        assert_eq!(ErrorCode::Large.to_string(), "expression too large");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(ErrorCode::MissingBracket, "[a-z");
        assert_eq!(
            err.to_string(),
            "error parsing regexp: missing closing ]: `[a-z`"
        );
    }

    #[test]
    fn test_parse_error_fields() {
        let err = ParseError::new(ErrorCode::InvalidEscape, r"\q");
        assert_eq!(err.code, ErrorCode::InvalidEscape);
        assert_eq!(err.expr, r"\q");
    }
}
