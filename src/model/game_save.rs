use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PersistError, StoreLoadError};
use crate::model::memory::{MemoryRecord, MemoryStore};

pub const SAVE_PREFIX: &str = "story";
pub const SAVE_EXTENSION: &str = "gsg";

/// On-disk form of a [`MemoryStore`]. Exactly these three fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameSave {
    pub entries: BTreeMap<String, Value>,
    pub history: Vec<MemoryRecord>,
    pub version: u64,
}

/// Overwrites `path` with the whole store.
pub fn save_story(store: &MemoryStore, path: &Path) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(&store.to_save())?;

    // Write next to the target and rename so a crash never leaves half a file.
    let tmp = path.with_extension(format!("{}.tmp", SAVE_EXTENSION));
    fs::write(&tmp, json).map_err(|source| PersistError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), version = store.latest_version(), "story saved");
    Ok(())
}

pub fn load_story(path: &Path) -> Result<MemoryStore, StoreLoadError> {
    let content = fs::read_to_string(path).map_err(|source| StoreLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let save: GameSave = serde_json::from_str(&content).map_err(|source| StoreLoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    if save.version != save.history.len() as u64 {
        return Err(StoreLoadError::Inconsistent {
            path: path.to_path_buf(),
            version: save.version,
            history: save.history.len(),
        });
    }
    for (i, record) in save.history.iter().enumerate() {
        if record.version != i as u64 + 1 {
            return Err(StoreLoadError::OutOfSequence {
                path: path.to_path_buf(),
                position: i + 1,
                version: record.version,
            });
        }
    }
    if let Some(key) = save
        .entries
        .keys()
        .find(|key| !save.history.iter().any(|r| &r.key == *key))
    {
        return Err(StoreLoadError::Untracked {
            path: path.to_path_buf(),
            key: key.clone(),
        });
    }

    tracing::info!(path = %path.display(), version = save.version, "story loaded");
    Ok(MemoryStore::from_save(save))
}

/// Sequence number embedded in `story_<n>.gsg`, if `file_name` has that form.
pub fn story_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(SAVE_PREFIX)?
        .strip_prefix('_')?
        .strip_suffix(SAVE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// One past the highest story number in `dir`, or 1 if there are none.
pub fn next_story_number(dir: &Path) -> io::Result<u32> {
    let mut highest: u32 = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(n) = entry.file_name().to_str().and_then(story_number) {
            highest = highest.max(n);
        }
    }
    highest.checked_add(1).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("{} already holds the last story number {}", dir.display(), highest),
        )
    })
}

pub fn story_file_name(number: u32) -> String {
    format!("{}_{}.{}", SAVE_PREFIX, number, SAVE_EXTENSION)
}

pub fn next_story_path(dir: &Path) -> io::Result<PathBuf> {
    Ok(dir.join(story_file_name(next_story_number(dir)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn parses_story_numbers() {
        assert_eq!(story_number("story_1.gsg"), Some(1));
        assert_eq!(story_number("story_42.gsg"), Some(42));
        assert_eq!(story_number("story_.gsg"), None);
        assert_eq!(story_number("story_x.gsg"), None);
        assert_eq!(story_number("story_3.json"), None);
        assert_eq!(story_number("tale_3.gsg"), None);
    }

    #[test]
    fn next_number_follows_highest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("story_1.gsg"), "{}").unwrap();
        fs::write(dir.path().join("story_3.gsg"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let path = next_story_path(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("story_4.gsg"));
    }

    #[test]
    fn last_story_number_is_an_error_not_a_wrap() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(story_file_name(u32::MAX)), "{}").unwrap();

        let err = next_story_number(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(next_story_path(dir.path()).is_err());
    }

    #[test]
    fn empty_dir_starts_at_one() {
        let dir = TempDir::new().unwrap();
        assert_eq!(next_story_number(dir.path()).unwrap(), 1);
    }

    #[test]
    fn save_then_load_restores_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story_1.gsg");

        let mut store = MemoryStore::new();
        store.write("character", json!({"emoji": "🗝", "name": "Ines", "choice": "a locksmith", "choice_type": "character"}));
        store.write("actions", json!([]));
        store.write("turn", json!(0));
        store.append_to_list("actions", json!({"turn_sequence": 1, "choice": "pick the lock", "consequence": "it clicks"}));

        save_story(&store, &path).unwrap();
        let loaded = load_story(&path).unwrap();

        assert_eq!(loaded.entries(), store.entries());
        assert_eq!(loaded.history(), store.history());
        assert_eq!(loaded.latest_version(), store.latest_version());
    }

    #[test]
    fn save_file_has_exactly_three_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story_1.gsg");
        let mut store = MemoryStore::new();
        store.write("turn", json!(0));
        save_story(&store, &path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let mut keys: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["entries", "history", "version"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_story(&dir.path().join("story_9.gsg")).unwrap_err();
        assert!(matches!(err, StoreLoadError::Io { .. }));
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story_1.gsg");
        fs::write(&path, "not a save").unwrap();
        assert!(matches!(load_story(&path), Err(StoreLoadError::Corrupt { .. })));
    }

    #[test]
    fn version_mismatch_is_inconsistent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story_1.gsg");
        fs::write(&path, r#"{"entries": {}, "history": [], "version": 2}"#).unwrap();
        assert!(matches!(
            load_story(&path),
            Err(StoreLoadError::Inconsistent { version: 2, history: 0, .. })
        ));
    }

    #[test]
    fn gaps_in_record_versions_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story_1.gsg");
        let mut store = MemoryStore::new();
        store.write("plot", json!("a"));
        store.write("plot", json!("b"));
        let mut save = store.to_save();
        save.history[1].version = 5;
        fs::write(&path, serde_json::to_string(&save).unwrap()).unwrap();

        assert!(matches!(
            load_story(&path),
            Err(StoreLoadError::OutOfSequence { position: 2, version: 5, .. })
        ));
    }

    #[test]
    fn entry_without_history_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story_1.gsg");
        let mut store = MemoryStore::new();
        store.write("plot", json!("a"));
        let mut save = store.to_save();
        save.entries.insert("prose".into(), json!("never logged"));
        fs::write(&path, serde_json::to_string(&save).unwrap()).unwrap();

        match load_story(&path) {
            Err(StoreLoadError::Untracked { key, .. }) => assert_eq!(key, "prose"),
            other => panic!("expected untracked entry, got {other:?}"),
        }
    }
}
