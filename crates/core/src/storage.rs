//! File-backed string key/value storage.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::warn;

/// Small persistent key/value store kept as one JSON object on disk.
///
/// Values are opaque strings; callers encode their own payloads.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the store at `path`. A missing file starts empty, and so does an
    /// unreadable one, which is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read storage {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(items) => items,
                Err(err) => {
                    warn!("Ignoring corrupt storage {}: {err}", path.display());
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, items })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under `key`.
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Store `value` under `key` and flush to disk.
    pub fn set_item(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.items.insert(key.to_string(), value.into());
        self.flush()
    }

    /// Delete `key` and write the file.
    pub fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let serialized =
            serde_json::to_vec_pretty(&self.items).context("failed to serialize storage")?;
        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        file.write_all(&serialized)?;
        file.persist(&self.path)
            .with_context(|| format!("failed to write storage {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn items_survive_reopen() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state").join("storage.json");

        let mut storage = LocalStorage::open(&path)?;
        assert_eq!(storage.get_item("theme"), None);
        storage.set_item("theme", "dark")?;
        storage.set_item("lang", "en")?;
        storage.remove_item("lang")?;

        let reopened = LocalStorage::open(&path)?;
        assert_eq!(reopened.get_item("theme"), Some("dark"));
        assert_eq!(reopened.get_item("lang"), None);
        Ok(())
    }

    #[test]
    fn corrupt_file_starts_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json")?;

        let mut storage = LocalStorage::open(&path)?;
        assert_eq!(storage.get_item("anything"), None);
        storage.set_item("key", "value")?;
        assert_eq!(LocalStorage::open(&path)?.get_item("key"), Some("value"));
        Ok(())
    }
}
