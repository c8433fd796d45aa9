use std::sync::{Arc, RwLock};

use anyhow::Result;
use log::warn;

use crate::models::ResultRecord;
use crate::storage::KvStore;

const HISTORY_KEY: &str = "document_history";
const HISTORY_CAPACITY: usize = 10;

/// Bounded cache of past recognition results, most-recent-first, persisted
/// after every mutation.
pub struct HistoryStore {
    store: Arc<dyn KvStore>,
    entries: RwLock<Vec<ResultRecord>>,
}

impl HistoryStore {
    /// Loads the persisted history. An absent, empty, or malformed payload
    /// yields an empty history; startup never fails on this path.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let entries = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ResultRecord>>(&raw) {
                Ok(mut list) => {
                    list.truncate(HISTORY_CAPACITY);
                    list
                }
                Err(err) => {
                    warn!("Discarding malformed history payload: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to read history from storage: {err:#}");
                Vec::new()
            }
        };

        Self {
            store,
            entries: RwLock::new(entries),
        }
    }

    /// Prepends a result, trims to capacity, and persists.
    pub fn add(&self, record: ResultRecord) -> Result<()> {
        let guard = {
            let mut guard = self.entries.write().unwrap();
            guard.insert(0, record);
            guard.truncate(HISTORY_CAPACITY);
            guard.clone()
        };
        self.persist(&guard)
    }

    /// Empties the history and removes the persisted key entirely.
    pub fn clear(&self) -> Result<()> {
        self.entries.write().unwrap().clear();
        self.store.delete(HISTORY_KEY)
    }

    pub fn list(&self) -> Vec<ResultRecord> {
        self.entries.read().unwrap().clone()
    }

    fn persist(&self, entries: &[ResultRecord]) -> Result<()> {
        let serialized = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, &serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, ExtractedInfo, RecognitionData};
    use crate::storage::testing::MemoryKvStore;
    use chrono::Utc;

    fn record(file_id: &str) -> ResultRecord {
        ResultRecord::from_recognition(
            RecognitionData {
                document_type: DocumentType::UtilityBill,
                confidence: 0.9,
                extracted_info: ExtractedInfo::default(),
                ocr_text: None,
                masked_image: None,
            },
            file_id.into(),
            Utc::now(),
        )
    }

    #[test]
    fn add_prepends_and_caps_at_ten() {
        let history = HistoryStore::load(Arc::new(MemoryKvStore::default()));

        for i in 0..12 {
            history
                .add(record(&format!("file-{i}")))
                .expect("add should persist");
        }

        let entries = history.list();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].file_id, "file-11");
        assert_eq!(entries[9].file_id, "file-2");
    }

    #[test]
    fn entries_survive_a_reload() {
        let store = Arc::new(MemoryKvStore::default());

        let history = HistoryStore::load(store.clone());
        history.add(record("abc123")).expect("add should persist");

        let reloaded = HistoryStore::load(store);
        let entries = reloaded.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_id, "abc123");
    }

    #[test]
    fn clear_is_indistinguishable_from_a_fresh_store() {
        let store = Arc::new(MemoryKvStore::default());

        let history = HistoryStore::load(store.clone());
        history.add(record("abc123")).expect("add should persist");
        history.clear().expect("clear should succeed");

        assert!(history.list().is_empty());
        assert_eq!(store.get("document_history").unwrap(), None);
        assert!(HistoryStore::load(store).list().is_empty());
    }

    #[test]
    fn malformed_payload_loads_as_empty() {
        let store = Arc::new(MemoryKvStore::with_entry(
            "document_history",
            "{\"not\":\"an array\"}",
        ));
        let history = HistoryStore::load(store);
        assert!(history.list().is_empty());
    }

    #[test]
    fn oversized_persisted_payload_is_truncated_on_load() {
        let records: Vec<ResultRecord> = (0..15).map(|i| record(&format!("file-{i}"))).collect();
        let serialized = serde_json::to_string(&records).expect("records should serialize");
        let store = Arc::new(MemoryKvStore::with_entry("document_history", &serialized));

        let history = HistoryStore::load(store);
        assert_eq!(history.list().len(), 10);
    }
}
