//! Error types for the storage boundary.

use skein_weave::TreeError;
use thiserror::Error;
use ulid::Ulid;

/// Errors that can occur at the storage boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown instance: {0}")]
    UnknownInstance(Ulid),

    /// Decoded state that fails revalidation: misplaced atoms, a weft
    /// that disagrees with its yarns, reserved identities.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
