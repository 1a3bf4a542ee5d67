//! Error types for the hangman server

use std::io;
use thiserror::Error;

/// Faults that stop the server outright
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Reasons an operator-supplied secret word is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    #[error("word cannot be empty")]
    Empty,
    #[error("word cannot contain spaces")]
    ContainsWhitespace,
}
