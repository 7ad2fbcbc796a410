// ── Storage backends ──
//
// A backend stores one opaque JSON document per collection. It knows
// nothing about records; the store handles encoding and rollback.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::debug;

use super::StoreError;

/// Persistence port for the assignment store.
pub trait StorageBackend: Send + Sync {
    /// The stored document, or `None` if the collection was never written.
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError>;

    /// Replace the stored document.
    fn persist(&self, collection: &str, contents: &str) -> Result<(), StoreError>;
}

fn byte_len(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local backend with an optional byte quota shared by all
/// collections.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: DashMap<String, String>,
    quota_bytes: Option<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            documents: DashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently held across all collections.
    pub fn used_bytes(&self) -> u64 {
        self.documents.iter().map(|d| byte_len(d.value().len())).sum()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError> {
        Ok(self.documents.get(collection).map(|d| d.value().clone()))
    }

    fn persist(&self, collection: &str, contents: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota_bytes {
            let others: u64 = self
                .documents
                .iter()
                .filter(|d| d.key() != collection)
                .map(|d| byte_len(d.value().len()))
                .sum();
            let required = others + byte_len(contents.len());
            if required > limit {
                return Err(StoreError::QuotaExceeded {
                    collection: collection.to_owned(),
                    required,
                    limit,
                });
            }
        }
        self.documents
            .insert(collection.to_owned(), contents.to_owned());
        Ok(())
    }
}

// ── File-backed ──────────────────────────────────────────────────────

/// One `<collection>.json` file per collection inside a directory.
///
/// Writes go to a temporary sibling and are renamed into place, so a crash
/// mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    #[must_use]
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    /// Size of every other collection document in the directory.
    fn other_documents_bytes(&self, collection: &str) -> Result<u64, std::io::Error> {
        let own = self.path_for(collection);
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path != own && path.extension().is_some_and(|ext| ext == "json") {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }

    fn io_error(collection: &str, required: u64, limit: u64, source: std::io::Error) -> StoreError {
        match source.kind() {
            ErrorKind::StorageFull | ErrorKind::QuotaExceeded => StoreError::QuotaExceeded {
                collection: collection.to_owned(),
                required,
                limit,
            },
            _ => StoreError::Io {
                collection: collection.to_owned(),
                source,
            },
        }
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(collection)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                collection: collection.to_owned(),
                source,
            }),
        }
    }

    fn persist(&self, collection: &str, contents: &str) -> Result<(), StoreError> {
        let size = byte_len(contents.len());
        let limit = self.quota_bytes.unwrap_or(0);
        let wrap = |source| Self::io_error(collection, size, limit, source);

        fs::create_dir_all(&self.dir).map_err(wrap)?;

        if let Some(limit) = self.quota_bytes {
            let required = self.other_documents_bytes(collection).map_err(wrap)? + size;
            if required > limit {
                return Err(StoreError::QuotaExceeded {
                    collection: collection.to_owned(),
                    required,
                    limit,
                });
            }
        }

        let target = self.path_for(collection);
        let tmp = self.dir.join(format!(".{collection}.json.tmp"));
        let write = || -> Result<(), std::io::Error> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &target)
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(wrap(e));
        }

        debug!(collection, path = %target.display(), bytes = size, "persisted collection");
        Ok(())
    }
}
