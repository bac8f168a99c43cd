use thiserror::Error;

use crate::backend::BackendError;
use crate::record::RecordKey;

/// A collaborator failed mid-walk. The whole top-level call is abandoned;
/// commands already flushed stay committed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Looking up the localization of {key} failed: {source}")]
    Lookup { key: RecordKey, source: BackendError },
    #[error("Fetching {key} failed: {source}")]
    Fetch { key: RecordKey, source: BackendError },
    #[error("Flushing the pending command for {key} failed: {source}")]
    Flush { key: RecordKey, source: BackendError },
}

impl ResolveError {
    /// The record whose lookup, fetch or flush failed.
    pub fn key(&self) -> &RecordKey {
        match self {
            ResolveError::Lookup { key, .. }
            | ResolveError::Fetch { key, .. }
            | ResolveError::Flush { key, .. } => key,
        }
    }
}
