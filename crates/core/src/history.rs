//! Recent search terms.

use anyhow::{Context, Result};
use tracing::warn;

use crate::storage::LocalStorage;

/// Storage key holding the JSON-encoded history.
pub const HISTORY_KEY: &str = "searchHistory";
/// Number of searches remembered.
pub const HISTORY_LIMIT: usize = 5;

/// Most-recent-first list of distinct search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    /// Read the history from `storage`. Unparseable content yields an empty history.
    pub fn load(storage: &LocalStorage) -> Self {
        let Some(raw) = storage.get_item(HISTORY_KEY) else {
            return Self::default();
        };

        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_LIMIT);
                Self { entries }
            }
            Err(err) => {
                warn!("Ignoring unreadable search history: {err}");
                Self::default()
            }
        }
    }

    /// Write the history back to `storage`.
    pub fn persist(&self, storage: &mut LocalStorage) -> Result<()> {
        let encoded =
            serde_json::to_string(&self.entries).context("failed to encode search history")?;
        storage.set_item(HISTORY_KEY, encoded)
    }

    /// Put `text` at the front, removing any earlier occurrence and
    /// dropping the oldest entry beyond the limit. Blank text is ignored.
    pub fn record(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.entries.retain(|entry| entry != text);
        self.entries.insert(0, text.to_string());
        self.entries.truncate(HISTORY_LIMIT);
    }

    /// Stored terms, most recent first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether nothing has been searched yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn keeps_five_most_recent() {
        let mut history = SearchHistory::default();
        for text in ["a", "b", "c", "d", "e", "f"] {
            history.record(text);
        }
        assert_eq!(history.entries(), ["f", "e", "d", "c", "b"]);

        history.record("c");
        assert_eq!(history.entries(), ["c", "f", "e", "d", "b"]);
    }

    #[test]
    fn blank_searches_are_not_recorded() {
        let mut history = SearchHistory::default();
        history.record("   ");
        history.record("");
        assert!(history.is_empty());
    }

    #[test]
    fn round_trips_through_storage() -> Result<()> {
        let dir = tempdir()?;
        let mut storage = LocalStorage::open(dir.path().join("storage.json"))?;

        let mut history = SearchHistory::load(&storage);
        assert!(history.is_empty());
        history.record("portal");
        history.record("hades");
        history.persist(&mut storage)?;

        let storage = LocalStorage::open(storage.path())?;
        assert_eq!(storage.get_item(HISTORY_KEY), Some(r#"["hades","portal"]"#));
        assert_eq!(SearchHistory::load(&storage).entries(), ["hades", "portal"]);
        Ok(())
    }

    #[test]
    fn unreadable_history_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let mut storage = LocalStorage::open(dir.path().join("storage.json"))?;
        storage.set_item(HISTORY_KEY, "not a list")?;

        assert!(SearchHistory::load(&storage).is_empty());
        Ok(())
    }
}
