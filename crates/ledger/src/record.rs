//! In-memory progress record and the fresh/persisted merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from work-item key to completion flag.
///
/// Keys iterate in sorted order, so the same record always yields the same
/// transfer order and the same file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    entries: BTreeMap<String, bool>,
}

/// On-disk flag: `0`/`1` as written, `true`/`false` accepted when reading.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFlag {
    Int(u8),
    Bool(bool),
}

impl ProgressRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record holding `keys`, all flagged not completed.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter().map(|k| (k.into(), false)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the flag for `key`, or `None` if the key is unknown.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sets the flag for `key` to completed. Returns `false` if the key is unknown.
    ///
    /// There is no inverse: a completed key stays completed.
    pub fn mark_done(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(done) => {
                *done = true;
                true
            }
            None => false,
        }
    }

    /// Iterates `(key, done)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keys still waiting for a successful transfer, in key order.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, done)| !done).map(|(k, _)| k)
    }

    pub fn completed_count(&self) -> usize {
        self.entries.values().filter(|done| **done).count()
    }

    pub fn pending_count(&self) -> usize {
        self.len() - self.completed_count()
    }

    /// Serializes to the human-inspectable `{"key": 0 | 1}` form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses the `{"key": 0 | 1}` form.
    ///
    /// Any flag other than `0`, `1`, `true` or `false` makes the whole
    /// document invalid.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, StoredFlag> = serde_json::from_str(content)?;
        let mut entries = BTreeMap::new();
        for (key, flag) in raw {
            let done = match flag {
                StoredFlag::Bool(b) => b,
                StoredFlag::Int(0) => false,
                StoredFlag::Int(1) => true,
                StoredFlag::Int(other) => {
                    return Err(serde::de::Error::custom(format!(
                        "invalid flag {other} for key {key}"
                    )));
                }
            };
            entries.insert(key, done);
        }
        Ok(Self { entries })
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ProgressRecord {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for ProgressRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, u8::from(*v))))
    }
}

/// Reconciles a freshly discovered work set with previously persisted progress.
///
/// The result holds every key of either input exactly once. A key present in
/// `persisted` keeps its persisted flag; a key only in `fresh` is not completed.
pub fn merge(fresh: &ProgressRecord, persisted: &ProgressRecord) -> ProgressRecord {
    let mut entries: BTreeMap<String, bool> =
        fresh.entries.keys().map(|k| (k.clone(), false)).collect();
    for (key, done) in &persisted.entries {
        entries.insert(key.clone(), *done);
    }
    ProgressRecord { entries }
}
