// ── Persisted record collection ──
//
// A `DashMap` cache of one collection plus the envelope codec used to
// write it out. Mutations are serialized per collection and rolled back
// if the backend refuses the write.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StoreError;
use super::backend::StorageBackend;
use crate::model::{EntityId, ProfileAssignment, SiteAssignment};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u64 = 1;

/// A record that can live in a [`Collection`].
pub(crate) trait Record: Clone + Serialize + DeserializeOwned + Send + Sync {
    fn key(&self) -> String;

    fn wlan_id(&self) -> &EntityId;

    /// Refresh timestamps (and versions) before the record is written.
    fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>);
}

impl Record for SiteAssignment {
    fn key(&self) -> String {
        SiteAssignment::key(self)
    }

    fn wlan_id(&self) -> &EntityId {
        &self.wlan_id
    }

    fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        if let Some(prev) = previous {
            self.created_at = prev.created_at;
        }
        self.updated_at = now;
    }
}

impl Record for ProfileAssignment {
    fn key(&self) -> String {
        ProfileAssignment::key(self)
    }

    fn wlan_id(&self) -> &EntityId {
        &self.wlan_id
    }

    fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        self.version = previous.map_or(0, |p| p.version) + 1;
        self.updated_at = now;
    }
}

/// A pending change: `Some` upserts, `None` removes.
pub(crate) type Change<T> = (String, Option<T>);

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    schema_version: u64,
    records: BTreeMap<String, T>,
}

pub(crate) struct Collection<T: Record> {
    name: &'static str,
    records: DashMap<String, T>,
    write_lock: Mutex<()>,
}

impl<T: Record> Collection<T> {
    pub(crate) fn empty(name: &'static str) -> Self {
        Self {
            name,
            records: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the collection's document from the backend.
    pub(crate) fn load(name: &'static str, backend: &dyn StorageBackend) -> Result<Self, StoreError> {
        let collection = Self::empty(name);
        if let Some(raw) = backend.load(name)? {
            // Re-keyed from the record itself so older documents pick up
            // the current key escaping.
            for record in collection.decode(&raw)?.into_values() {
                collection.records.insert(record.key(), record);
            }
        }
        Ok(collection)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub(crate) fn get(&self, key: &str) -> Option<T> {
        self.records.get(key).map(|r| r.value().clone())
    }

    pub(crate) fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    pub(crate) fn for_wlan(&self, wlan_id: &EntityId) -> Vec<T> {
        self.filter(|r| r.wlan_id() == wlan_id)
    }

    pub(crate) fn wlan_ids(&self) -> Vec<EntityId> {
        self.records.iter().map(|r| r.value().wlan_id().clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a set of changes and persist them as one document write.
    ///
    /// `plan` runs under the collection's write lock and sees the current
    /// records; it returns the changes plus a value for the caller. If the
    /// backend rejects the write every change is undone.
    pub(crate) fn commit<R>(
        &self,
        backend: &dyn StorageBackend,
        plan: impl FnOnce(&Self) -> Result<(Vec<Change<T>>, R), StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (changes, output) = plan(self)?;
        if changes.is_empty() {
            return Ok(output);
        }

        let mut undo: Vec<Change<T>> = Vec::with_capacity(changes.len());
        for (key, next) in changes {
            let prior = match next {
                Some(record) => self.records.insert(key.clone(), record),
                None => self.records.remove(&key).map(|(_, v)| v),
            };
            undo.push((key, prior));
        }

        let written = self
            .encode()
            .and_then(|doc| backend.persist(self.name, &doc));

        if let Err(e) = written {
            for (key, prior) in undo.into_iter().rev() {
                match prior {
                    Some(record) => {
                        self.records.insert(key, record);
                    }
                    None => {
                        self.records.remove(&key);
                    }
                }
            }
            return Err(e);
        }
        Ok(output)
    }

    // ── Codec ────────────────────────────────────────────────────────

    fn encode(&self) -> Result<String, StoreError> {
        let records: BTreeMap<String, T> = self
            .records
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            records,
        };
        serde_json::to_string_pretty(&envelope).map_err(|source| self.serialization(source))
    }

    /// Accepts the current envelope or a bare version-0 key/record map.
    fn decode(&self, raw: &str) -> Result<BTreeMap<String, T>, StoreError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| self.serialization(e))?;
        let found = value.get("schemaVersion").and_then(Value::as_u64);

        let records = match found {
            Some(found) if found > SCHEMA_VERSION => {
                return Err(StoreError::UnsupportedSchema {
                    collection: self.name.to_owned(),
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
            Some(_) => value.get("records").cloned().unwrap_or(Value::Null),
            None => value,
        };
        if records.is_null() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_value(records).map_err(|e| self.serialization(e))
    }

    fn serialization(&self, source: serde_json::Error) -> StoreError {
        StoreError::Serialization {
            collection: self.name.to_owned(),
            source,
        }
    }
}
