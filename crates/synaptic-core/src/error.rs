//! Error types for Synaptic

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("atom already exists: {0}")]
    DuplicateAtom(String),

    #[error("atom not found: {0}")]
    AtomNotFound(String),

    #[error("malformed snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("non-finite weight on atom {id}")]
    NonFiniteWeight { id: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            reason: reason.into(),
        }
    }

    pub fn non_finite(id: impl Into<String>) -> Self {
        Self::NonFiniteWeight { id: id.into() }
    }
}
