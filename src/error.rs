//! Error types for the document store

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the index, the persistence codec, and the backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert-time rejection: the index is dimension-locked after the first
    /// successful insert.
    #[error("dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A persisted artifact is missing. All three artifacts must exist
    /// together or the store is considered absent.
    #[error("no persisted index at {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted artifact exists but cannot be decoded. Loading leaves the
    /// in-memory index in its prior state.
    #[error("corrupt index data: {0}")]
    Corrupt(String),

    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("the {0} backend does not support persistence")]
    PersistenceUnsupported(&'static str),

    #[error("remote store error: {0}")]
    Remote(String),

    #[error("configuration error: {0}")]
    Config(String),
}
