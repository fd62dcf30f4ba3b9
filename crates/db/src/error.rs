//! Error taxonomy for record store operations

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a record store.
///
/// `NotFound` and `Conflict` are outcomes the caller is expected to handle;
/// everything else means the store itself is unusable for this request.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no record with key '{key}' in '{collection}'")]
    NotFound { collection: String, key: String },

    #[error("record with key '{key}' already exists in '{collection}'")]
    Conflict { collection: String, key: String },

    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),

    #[error("corrupt or unencodable record: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn conflict(collection: &str, key: &str) -> Self {
        Self::Conflict {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
