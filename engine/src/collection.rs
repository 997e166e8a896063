//! Ordered record collections.
//!
//! A collection is the unit of local persistence: one JSON-serialized array
//! of domain records per named key. Order is caller-defined (typically
//! most-recent-first) and the engine preserves whatever order it is given,
//! which is why this is a `Vec` and not a map.

use crate::{error::Result, Error, RecordId, SyncRecord};
use serde::{Deserialize, Serialize};

/// An ordered sequence of domain records stored under one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<R> {
    records: Vec<R>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: SyncRecord> Collection<R> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Get a mutable record by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut R> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    /// Check if a record with the given ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Append a record, preserving insertion order.
    pub fn push(&mut self, record: R) {
        self.records.push(record);
    }

    /// Remove a record by ID, preserving the order of the remainder.
    ///
    /// Returns the removed record, or `None` if the ID is absent. Removing
    /// an absent ID is a no-op by design (delete idempotence).
    pub fn remove(&mut self, id: &str) -> Option<R> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    /// Iterate over records in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    /// Record IDs in stored order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.iter().map(|r| r.id())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize to the persisted JSON form (an array of records).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.records).map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Deserialize from the persisted JSON form.
    ///
    /// Timestamp-typed fields are revived according to each record's serde
    /// annotations (see [`crate::timestamp`]).
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<R> =
            serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))?;
        Ok(Self { records })
    }
}

impl<R> From<Vec<R>> for Collection<R> {
    fn from(records: Vec<R>) -> Self {
        Self { records }
    }
}

impl<R> FromIterator<R> for Collection<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<R> IntoIterator for Collection<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a Collection<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
