use std::{error::Error, fmt::Display, io};

/// Everything that can go wrong while reading a CASTEP file. Line numbers are
/// 1-based.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    Io(io::ErrorKind, String),
    Float { line: usize, token: String },
    Int { line: usize, token: String },
    MissingField { line: usize, index: usize },
    AtomIndex { line: usize, index: String },
    Config(String),
}

impl ParseError {
    /// Returns `true` if the error came from a malformed number or a short
    /// line rather than from the input stream itself
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Float { .. } | Self::Int { .. } | Self::MissingField { .. }
        )
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(kind, msg) => write!(f, "i/o error ({kind}): {msg}"),
            ParseError::Float { line, token } => {
                write!(f, "line {line}: failed to parse `{token}` as a float")
            }
            ParseError::Int { line, token } => {
                write!(f, "line {line}: failed to parse `{token}` as an integer")
            }
            ParseError::MissingField { line, index } => {
                write!(f, "line {line}: missing field {index}")
            }
            ParseError::AtomIndex { line, index } => {
                write!(f, "line {line}: no atom matches `{index}`")
            }
            ParseError::Config(s) => write!(f, "invalid configuration: {s}"),
        }
    }
}

impl Error for ParseError {}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind(), e.to_string())
    }
}
