//! File-backed snapshot persistence.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use autosre_domain::Snapshot;
use autosre_ports::SnapshotPort;

/// Stores the snapshot as a single pretty-printed JSON document.
///
/// Saves go through a sibling temp file and a rename so a crash mid-write
/// leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotPort for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read snapshot {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Snapshot::from_json(&raw)
            .with_context(|| format!("snapshot {} is unreadable", self.path.display()))
            .map(Some)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = snapshot.to_json()?;
        let temp = self.temp_path();
        fs::write(&temp, raw).with_context(|| format!("failed to write {}", temp.display()))?;
        fs::rename(&temp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::trace!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", self.path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosre_domain::{Event, EventLevel};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileSnapshotStore {
        JsonFileSnapshotStore::new(dir.path().join("state").join("snapshot.json"))
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_creates_parent_and_reloads() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut snapshot = Snapshot::default();
        snapshot.metrics.insert("cpu".into(), 42.0);
        snapshot
            .logs
            .push(Event::at(EventLevel::Info, "hello", 1_000));
        snapshot.next_seq = 9;

        store.save(&snapshot).unwrap();
        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json at all").unwrap();
        let err = store.load().unwrap_err();
        assert!(format!("{err:#}").contains("unreadable"));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.clear().unwrap();
        store.save(&Snapshot::default()).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_none());
    }
}
