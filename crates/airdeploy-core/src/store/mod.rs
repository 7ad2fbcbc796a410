// ── Assignment store ──
//
// Durable record of intended deployment state. Two collections keyed by
// composite identity, cached in memory and written through to an injected
// `StorageBackend` on every mutation.

mod assignment_store;
mod backend;
mod collection;

use thiserror::Error;

pub use assignment_store::{AssignmentStore, PROFILE_ASSIGNMENTS, SITE_ASSIGNMENTS};
pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use collection::SCHEMA_VERSION;

/// Errors from the assignment store and its backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is out of room. Distinct from `Io` so callers can ask
    /// the user to clean up instead of dropping the write.
    #[error("storage quota exceeded writing {collection}: need {required} bytes, limit is {limit}")]
    QuotaExceeded {
        collection: String,
        required: u64,
        limit: u64,
    },

    #[error("storage I/O error on {collection}: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {collection} document: {source}")]
    Serialization {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection} was written by a newer version (schema {found}, supported {supported})")]
    UnsupportedSchema {
        collection: String,
        found: u64,
        supported: u64,
    },

    #[error("no {collection} record for key {key}")]
    NotFound { collection: String, key: String },

    #[error("{key} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        key: String,
        expected: u64,
        found: u64,
    },

    #[error("refusing to change the intended state of {key}")]
    IdentityChanged { key: String },
}
