use std::path::PathBuf;
use thiserror::Error;

/// Malformed room template text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: '{token}' is not an integer")]
    InvalidInteger { line: usize, token: String },

    #[error("line {line}: unexpected trailing data")]
    TrailingData { line: usize },
}

/// A template file that could not be turned into a `RoomTemplate`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unable to load template '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse template '{}': {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },
}

impl LoadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => path,
        }
    }
}

/// A template that could not be written out.
#[derive(Error, Debug)]
#[error("unable to save template '{}': {source}", path.display())]
pub struct SaveError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bad config: {message}")]
    Ron { message: String },
}
