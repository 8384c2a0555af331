//! Error types for detype

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Source location in TypeScript code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
    /// Byte offset in source
    pub offset: usize,
}

impl SourceLocation {
    /// Compute the line/column of a byte offset by scanning the source
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = source[line_start..offset].chars().count() as u32 + 1;
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Format a source context with caret pointer for errors
pub fn format_error_context(source: &str, location: &SourceLocation) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = (location.line.saturating_sub(1)) as usize;

    if line_idx >= lines.len() {
        return String::new();
    }

    let mut result = String::new();
    let line_num_width = format!("{}", location.line + 1).len().max(3);

    if line_idx > 0 {
        result.push_str(&format!(
            "{:>width$} | {}\n",
            location.line - 1,
            lines[line_idx - 1],
            width = line_num_width
        ));
    }

    result.push_str(&format!(
        "{:>width$} | {}\n",
        location.line,
        lines[line_idx],
        width = line_num_width
    ));

    let pointer_offset = (location.column.saturating_sub(1)) as usize;
    result.push_str(&format!(
        "{:>width$} | {}^\n",
        "",
        " ".repeat(pointer_offset),
        width = line_num_width
    ));

    result
}

/// A syntax problem found while parsing or binding a file.
///
/// Any diagnostic aborts the transform of its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

/// Main error type for detype
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Lexer error - invalid token or character
    #[error("SyntaxError: {message} at {location}{}", if source_context.is_empty() { String::new() } else { format!("\n{}", source_context) })]
    LexerError {
        message: String,
        location: SourceLocation,
        source_context: String,
    },

    /// Parser error - invalid syntax
    #[error("SyntaxError: {message} at {location}{}", if source_context.is_empty() { String::new() } else { format!("\n{}", source_context) })]
    ParseError {
        message: String,
        location: SourceLocation,
        source_context: String,
    },

    /// tsconfig.json could not be read or holds unsupported values
    #[error("ConfigError: {message}")]
    ConfigError {
        message: String,
        path: Option<PathBuf>,
    },

    /// An option value that the transpiler does not understand
    #[error("InvalidOption: {0}")]
    InvalidOption(String),

    /// IO error
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a new lexer error
    pub fn lexer_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Error::LexerError {
            message: message.into(),
            location,
            source_context: String::new(),
        }
    }

    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Error::ParseError {
            message: message.into(),
            location,
            source_context: String::new(),
        }
    }

    /// Create a new parse error with source context
    pub fn parse_error_with_context(
        message: impl Into<String>,
        location: SourceLocation,
        source: &str,
    ) -> Self {
        Error::ParseError {
            message: message.into(),
            source_context: format_error_context(source, &location),
            location,
        }
    }

    /// Create a config error, optionally tied to the file it came from
    pub fn config_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Error::ConfigError {
            message: message.into(),
            path,
        }
    }

    /// Add source context to an existing error
    pub fn with_source_context(self, source: &str) -> Self {
        match self {
            Error::LexerError {
                message, location, ..
            } => Error::LexerError {
                message,
                source_context: format_error_context(source, &location),
                location,
            },
            Error::ParseError {
                message, location, ..
            } => Error::ParseError {
                message,
                source_context: format_error_context(source, &location),
                location,
            },
            other => other,
        }
    }

    /// Location of a syntax error, if this is one
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Error::LexerError { location, .. } | Error::ParseError { location, .. } => {
                Some(*location)
            }
            _ => None,
        }
    }
}

impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::LexerError {
                message,
                location,
                source_context,
            } => Error::LexerError {
                message: message.clone(),
                location: *location,
                source_context: source_context.clone(),
            },
            Error::ParseError {
                message,
                location,
                source_context,
            } => Error::ParseError {
                message: message.clone(),
                location: *location,
                source_context: source_context.clone(),
            },
            Error::ConfigError { message, path } => Error::ConfigError {
                message: message.clone(),
                path: path.clone(),
            },
            Error::InvalidOption(message) => Error::InvalidOption(message.clone()),
            Error::IoError { source } => Error::IoError {
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
        }
    }
}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        Error::parse_error(diagnostic.message, diagnostic.location)
    }
}

/// Result type alias for detype
pub type Result<T> = std::result::Result<T, Error>;

/// Message templates shared by the lexer and parser.
pub mod messages {
    pub const UNEXPECTED_TOKEN: &str = "Unexpected token";
    pub const UNEXPECTED_END: &str = "Unexpected end of input";
    pub const UNTERMINATED_STRING: &str = "Unterminated string literal";
    pub const UNTERMINATED_TEMPLATE: &str = "Unterminated template literal";
    pub const UNTERMINATED_REGEX: &str = "Unterminated regular expression";
    pub const UNTERMINATED_COMMENT: &str = "Unterminated comment";

    /// Format an "Expected X, found Y" message
    pub fn expected(what: &str, found: &str) -> String {
        format!("Expected {}, found '{}'", what, found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_offset() {
        let src = "let a;\nlet bc = 1;\n";
        let loc = SourceLocation::from_offset(src, 11);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 5);
        assert_eq!(loc.offset, 11);
    }

    #[test]
    fn test_parse_error_context_has_caret() {
        let src = "let a = 1;\nlet = 2;\n";
        let loc = SourceLocation::from_offset(src, 15);
        let err = Error::parse_error_with_context("Expected identifier", loc, src);
        let text = err.to_string();
        assert!(text.contains("SyntaxError: Expected identifier at 2:5"));
        assert!(text.contains("  2 | let = 2;"));
        assert!(text.contains("    ^"));
    }

    #[test]
    fn test_diagnostic_into_error() {
        let d = Diagnostic::new("duplicate 'export ='", SourceLocation::default());
        let err: Error = d.into();
        assert!(matches!(err, Error::ParseError { .. }));
    }
}
