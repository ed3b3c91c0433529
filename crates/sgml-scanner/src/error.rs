//! Errors raised while opening or scanning character sources.

use std::fmt;

use crate::Location;

/// Failure to open a character source.
#[derive(Debug)]
pub enum SourceError {
    /// An external entity has no system identifier and the resolver has no
    /// mapping for its public identifier.
    MissingSystemId { public_id: Option<String> },
    /// The resource could not be read.
    Io { uri: String, error: std::io::Error },
    /// The resource is not valid text in any supported encoding.
    Decode { uri: String, message: String },
    /// Pushing would exceed the maximum nesting depth.
    TooDeep { limit: usize },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::MissingSystemId {
                public_id: Some(id),
            } => write!(f, "no system identifier and no mapping for public identifier \"{id}\""),
            SourceError::MissingSystemId { public_id: None } => {
                write!(f, "no system identifier")
            }
            SourceError::Io { uri, error } => write!(f, "cannot read '{uri}': {error}"),
            SourceError::Decode { uri, message } => write!(f, "cannot decode '{uri}': {message}"),
            SourceError::TooDeep { limit } => {
                write!(f, "entity nesting too deep (limit is {limit})")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A lexical error at a position in the current source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub location: Location,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, location: Location) -> Self {
        Self { kind, location }
    }
}

/// Kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// A name started with a character that cannot start a name.
    InvalidNameStart(char),
    /// A name contained a character that is not a name character.
    InvalidNameChar(char),
    /// A token was expected but a terminator was found.
    ExpectedToken(char),
    /// A quoted literal was expected.
    ExpectedLiteral(char),
    /// Input ended where something else was required.
    UnexpectedEof { expected: &'static str },
    /// A quoted literal was not closed before the end of its source.
    UnterminatedLiteral { line: u32 },
    /// A comment or marked section was not closed before the end of its source.
    Unterminated { what: &'static str, line: u32 },
    /// A character reference names no valid character.
    InvalidCharRef(String),
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::InvalidNameStart(c) => write!(f, "invalid name start character '{c}'"),
            ScanErrorKind::InvalidNameChar(c) => write!(f, "invalid name character '{c}'"),
            ScanErrorKind::ExpectedToken(c) => write!(f, "expecting a token but found '{c}'"),
            ScanErrorKind::ExpectedLiteral(c) => {
                write!(f, "expecting a quoted literal but found '{c}'")
            }
            ScanErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            ScanErrorKind::UnterminatedLiteral { line } => {
                write!(f, "literal starting on line {line} was not closed")
            }
            ScanErrorKind::Unterminated { what, line } => {
                write!(f, "{what} starting on line {line} was not closed")
            }
            ScanErrorKind::InvalidCharRef(text) => write!(f, "invalid character reference '{text}'"),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.location)
    }
}

impl std::error::Error for ScanError {}
