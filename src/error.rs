//! Error types shared by both codec modes.

use thiserror::Error;

/// Top-level error for every encode/decode operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, rejected before any I/O happens.
    #[error("configuration error: {0}")]
    Config(String),

    /// Source or destination I/O failure; aborts the whole operation.
    /// Partial output is left behind, it is regenerable but not resumable.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decode-only: the container is structurally inconsistent.
    #[error("malformed container: {0}")]
    Malformed(#[from] ContainerError),
}

/// Structural failures while parsing an encoded container.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    /// A read ran past the end of the available bits.
    #[error("unexpected end of bit stream")]
    UnexpectedEof,

    /// The container is shorter than its fixed header.
    #[error("container shorter than its fixed header")]
    TruncatedHeader,

    /// A header field holds a value the format cannot produce.
    #[error("header field out of range: {0}")]
    FieldOutOfRange(&'static str),

    /// The adaptive header names a model update policy we don't know.
    #[error("unknown model update policy")]
    UnknownPolicy,

    /// The code stream ended in the middle of a code.
    #[error("bit stream ends inside a code")]
    DanglingCode,
}

pub type Result<T> = std::result::Result<T, Error>;
