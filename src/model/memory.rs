use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::game_save::GameSave;

/// One mutation in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub version: u64,
    pub key: String,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
}

/// Versioned key/value memory for the running story.
///
/// Every mutating call appends exactly one [`MemoryRecord`] and bumps the
/// global version, so `version == history.len()` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
    history: Vec<MemoryRecord>,
    version: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`, or `None` if it was never written.
    pub fn read(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Set `key` unconditionally and log the mutation.
    pub fn write(&mut self, key: &str, value: Value) {
        self.version += 1;

        // Wall clock can step backwards; the trail must not.
        let now = Utc::now();
        let timestamp = match self.history.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        self.entries.insert(key.to_string(), value.clone());
        self.history.push(MemoryRecord {
            version: self.version,
            key: key.to_string(),
            value,
            timestamp,
        });
    }

    /// Same as [`write`](Self::write): existing and new keys are both logged.
    pub fn update(&mut self, key: &str, value: Value) {
        if self.entries.contains_key(key) {
            tracing::trace!(key, "updating existing memory entry");
        }
        self.write(key, value);
    }

    pub fn latest_version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &[MemoryRecord] {
        &self.history
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    /// All current entries as one JSON object.
    pub fn snapshot_json(&self) -> String {
        let map: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map).to_string()
    }

    /// Reads a string entry, empty if missing or not a string.
    pub fn read_str(&self, key: &str) -> &str {
        self.read(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Reads a list entry, empty if missing or not a list.
    pub fn read_list(&self, key: &str) -> Vec<Value> {
        match self.read(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Appends `item` to the list under `key` as a single mutation.
    pub fn append_to_list(&mut self, key: &str, item: Value) {
        let mut items = self.read_list(key);
        items.push(item);
        self.update(key, Value::Array(items));
    }

    /// Text form of an entry for prompts. Records show their `choice` text.
    pub fn describe(&self, key: &str) -> String {
        match self.read(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(map)) => match map.get("choice").and_then(Value::as_str) {
                Some(choice) => {
                    let name = map.get("name").and_then(Value::as_str).unwrap_or("");
                    if name.is_empty() {
                        choice.to_string()
                    } else {
                        format!("{} - {}", name, choice)
                    }
                }
                None => Value::Object(map.clone()).to_string(),
            },
            Some(other) => other.to_string(),
        }
    }

    pub fn to_save(&self) -> GameSave {
        GameSave {
            entries: self.entries.clone(),
            history: self.history.clone(),
            version: self.version,
        }
    }

    /// Rebuilds a store from a decoded save. All three parts are taken verbatim.
    pub fn from_save(save: GameSave) -> Self {
        Self {
            entries: save.entries,
            history: save.history,
            version: save.version,
        }
    }

    /// Swaps in another store's state wholesale.
    pub fn replace_with(&mut self, other: MemoryStore) {
        *self = other;
    }
}
