use super::backend::StorageBackend;
use crate::error::Result;
use crate::model::Notice;
use indexmap::IndexMap;
use serde_json::Value;

/// One stored entry. Entries that fail to parse are kept verbatim so a save
/// does not lose them.
#[derive(Debug, Clone)]
enum Slot {
    Live(Notice),
    Corrupted { raw: Value, reason: String },
}

/// The working set of notices for one storage key.
///
/// Loaded once on [`open`](Self::open), mutated in memory, and written back
/// as a single blob by [`close`](Self::close), unless [`flush`](Self::flush)
/// removed the slot in between.
pub struct NoticeStore<B: StorageBackend> {
    backend: B,
    key: String,
    slots: IndexMap<String, Slot>,
    flushed: bool,
    closed: bool,
}

impl<B: StorageBackend> NoticeStore<B> {
    /// Boots the working set. A missing slot is an empty store.
    pub fn open(backend: B, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let slots = match backend.get(&key)? {
            Some(blob) => parse_slots(&key, &blob)?,
            None => IndexMap::new(),
        };

        tracing::debug!(key = %key, records = slots.len(), "notice store booted");

        Ok(Self {
            backend,
            key,
            slots,
            flushed: false,
            closed: false,
        })
    }

    /// Opens the store, runs `f` and commits once, whatever `f` returned.
    ///
    /// An error from `f` takes precedence over a failed commit.
    pub fn with_scope<T, F>(backend: B, key: impl Into<String>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut store = Self::open(backend, key)?;
        let outcome = f(&mut store);
        let committed = store.close();
        let value = outcome?;
        committed?;
        Ok(value)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Inserts by hash, replacing an identical earlier notice.
    pub fn add(&mut self, notice: Notice) -> String {
        let hash = notice.hash().to_string();
        let replaced = self.slots.insert(hash.clone(), Slot::Live(notice)).is_some();
        tracing::debug!(key = %self.key, hash = %hash, replaced, "notice added");
        hash
    }

    pub fn get(&self, hash: &str) -> Option<&Notice> {
        match self.slots.get(hash) {
            Some(Slot::Live(notice)) => Some(notice),
            _ => None,
        }
    }

    /// Whether any entry, readable or not, sits under `hash`.
    pub fn has(&self, hash: &str) -> bool {
        self.slots.contains_key(hash)
    }

    /// Live notices in insertion order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &Notice)> {
        self.slots.iter().filter_map(|(hash, slot)| match slot {
            Slot::Live(notice) => Some((hash.as_str(), notice)),
            Slot::Corrupted { .. } => None,
        })
    }

    /// Snapshot of every key, corrupted entries included, so callers can
    /// delete while walking it.
    pub fn hashes(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    /// Why the entry under `hash` could not be read, if it could not.
    pub fn corruption(&self, hash: &str) -> Option<&str> {
        match self.slots.get(hash) {
            Some(Slot::Corrupted { reason, .. }) => Some(reason),
            _ => None,
        }
    }

    pub fn corrupted(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().filter_map(|(hash, slot)| match slot {
            Slot::Corrupted { reason, .. } => Some((hash.as_str(), reason.as_str())),
            Slot::Live(_) => None,
        })
    }

    /// Removes the entry if present. Returns whether it existed.
    pub fn delete(&mut self, hash: &str) -> bool {
        self.slots.shift_remove(hash).is_some()
    }

    /// Number of live notices.
    pub fn len(&self) -> usize {
        self.all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes the backing slot now and skips the final commit. The loaded
    /// working set stays readable.
    pub fn flush(&mut self) -> Result<()> {
        let existed = self.backend.delete(&self.key)?;
        self.flushed = true;
        tracing::debug!(key = %self.key, existed, "notice store flushed");
        Ok(())
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Writes the whole working set as one blob.
    pub fn save(&self) -> Result<()> {
        let mut blob: IndexMap<&str, Value> = IndexMap::with_capacity(self.slots.len());
        for (hash, slot) in &self.slots {
            let value = match slot {
                Slot::Live(notice) => serde_json::to_value(notice)?,
                Slot::Corrupted { raw, .. } => raw.clone(),
            };
            blob.insert(hash.as_str(), value);
        }

        let serialized = serde_json::to_string(&blob)?;
        self.backend.set(&self.key, &serialized)?;
        tracing::debug!(key = %self.key, records = blob.len(), "notice store saved");
        Ok(())
    }

    /// Ends the store's scope: saves unless flushed.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        if self.flushed {
            return Ok(());
        }
        self.save()
    }
}

impl<B: StorageBackend> Drop for NoticeStore<B> {
    fn drop(&mut self) {
        if !self.closed && !self.flushed {
            tracing::warn!(key = %self.key, "notice store dropped without close; changes discarded");
        }
    }
}

impl<B: StorageBackend> std::fmt::Debug for NoticeStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeStore")
            .field("key", &self.key)
            .field("slots", &self.slots)
            .field("flushed", &self.flushed)
            .finish()
    }
}

/// Live entries are keyed by their recomputed hash, so a notice stored
/// under an outdated key still deduplicates against a fresh copy.
fn parse_slots(key: &str, blob: &str) -> Result<IndexMap<String, Slot>> {
    let raw: IndexMap<String, Value> = serde_json::from_str(blob)?;

    let slots = raw
        .into_iter()
        .map(|(stored, value)| match serde_json::from_value::<Notice>(value.clone()) {
            Ok(notice) => {
                let hash = notice.hash().to_string();
                if hash != stored {
                    tracing::debug!(key = %key, stored = %stored, hash = %hash, "stored notice re-keyed");
                }
                (hash, Slot::Live(notice))
            }
            Err(e) => {
                tracing::warn!(key = %key, hash = %stored, error = %e, "unreadable stored notice");
                let slot = Slot::Corrupted {
                    raw: value,
                    reason: e.to_string(),
                };
                (stored, slot)
            }
        })
        .collect();

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoticeError;
    use crate::model::NoticeType;
    use crate::store::MemBackend;

    const KEY: &str = "test_notices";

    fn notice(text: &str) -> Notice {
        Notice::new(text, NoticeType::Info)
    }

    #[test]
    fn test_missing_slot_boots_empty() {
        let backend = MemBackend::new();
        let store = NoticeStore::open(&backend, KEY).unwrap();
        assert!(store.is_empty());
        store.close().unwrap();
    }

    #[test]
    fn test_add_dedups_by_hash() {
        let backend = MemBackend::new();
        let mut store = NoticeStore::open(&backend, KEY).unwrap();

        let a = store.add(notice("Saved"));
        let b = store.add(notice("Saved"));
        store.add(notice("Other"));

        assert_eq!(a, b);
        assert_eq!(store.len(), 2);
        store.close().unwrap();
    }

    #[test]
    fn test_nothing_persists_before_close() {
        let backend = MemBackend::new();
        let mut store = NoticeStore::open(&backend, KEY).unwrap();
        store.add(notice("Saved"));
        assert_eq!(backend.write_count(), 0);

        store.close().unwrap();
        assert_eq!(backend.write_count(), 1);

        let reopened = NoticeStore::open(&backend, KEY).unwrap();
        assert_eq!(reopened.len(), 1);
        reopened.close().unwrap();
    }

    #[test]
    fn test_order_survives_reload() {
        let backend = MemBackend::new();
        let mut store = NoticeStore::open(&backend, KEY).unwrap();
        let hashes: Vec<String> = ["c", "a", "b"]
            .iter()
            .map(|t| store.add(notice(t)))
            .collect();
        store.close().unwrap();

        let reopened = NoticeStore::open(&backend, KEY).unwrap();
        assert_eq!(reopened.hashes(), hashes);
        reopened.close().unwrap();
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let backend = MemBackend::new();
        let mut store = NoticeStore::open(&backend, KEY).unwrap();
        let hash = store.add(notice("Saved"));

        assert!(store.delete(&hash));
        assert!(!store.delete(&hash));
        assert!(!store.delete("nope"));
        store.close().unwrap();
    }

    #[test]
    fn test_flush_suppresses_final_save() {
        let backend = MemBackend::new();
        NoticeStore::with_scope(&backend, KEY, |store| {
            store.add(notice("Saved"));
            Ok(())
        })
        .unwrap();
        assert!(backend.contains(KEY));

        let mut store = NoticeStore::open(&backend, KEY).unwrap();
        store.flush().unwrap();
        assert!(!backend.contains(KEY));
        // Loaded state stays readable after a flush.
        assert_eq!(store.len(), 1);
        store.close().unwrap();

        assert!(!backend.contains(KEY));
    }

    #[test]
    fn test_with_scope_commits_on_error() {
        let backend = MemBackend::new();
        let result: Result<()> = NoticeStore::with_scope(&backend, KEY, |store| {
            store.add(notice("Saved"));
            Err(NoticeError::InvalidArgument("boom".to_string()))
        });

        assert!(matches!(result, Err(NoticeError::InvalidArgument(_))));
        assert!(backend.contains(KEY));
    }

    #[test]
    fn test_write_failure_propagates() {
        let backend = MemBackend::new();
        let mut store = NoticeStore::open(&backend, KEY).unwrap();
        store.add(notice("Saved"));

        backend.set_simulate_write_error(true);
        assert!(matches!(store.close(), Err(NoticeError::Backend(_))));
    }

    #[test]
    fn test_read_failure_propagates() {
        let backend = MemBackend::new();
        backend.set_simulate_read_error(true);
        assert!(NoticeStore::open(&backend, KEY).is_err());
    }

    #[test]
    fn test_entries_are_rekeyed_by_content_hash() {
        let backend = MemBackend::new();
        let stale = notice("Saved");
        let mut blob = serde_json::Map::new();
        blob.insert("outdated".to_string(), serde_json::to_value(&stale).unwrap());
        backend.put_raw(KEY, &Value::Object(blob).to_string());

        let mut store = NoticeStore::open(&backend, KEY).unwrap();
        assert!(!store.has("outdated"));
        assert!(store.has(stale.hash()));

        store.add(notice("Saved"));
        assert_eq!(store.len(), 1);
        store.close().unwrap();

        let saved: Value = serde_json::from_str(&backend.raw(KEY).unwrap()).unwrap();
        assert!(saved.get("outdated").is_none());
        assert!(saved.get(stale.hash()).is_some());
    }

    #[test]
    fn test_unreadable_entries_are_kept() {
        let backend = MemBackend::new();
        let good = notice("Saved");
        let good_hash = good.hash().to_string();
        let mut blob = serde_json::Map::new();
        blob.insert("deadbeef".to_string(), serde_json::json!({ "message": 42 }));
        blob.insert(good_hash.clone(), serde_json::to_value(&good).unwrap());
        backend.put_raw(KEY, &Value::Object(blob).to_string());

        let store = NoticeStore::open(&backend, KEY).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.has("deadbeef"));
        assert!(store.get("deadbeef").is_none());
        assert!(store.corruption("deadbeef").is_some());
        assert_eq!(store.corrupted().count(), 1);
        store.close().unwrap();

        let saved: serde_json::Value = serde_json::from_str(&backend.raw(KEY).unwrap()).unwrap();
        assert_eq!(saved["deadbeef"], serde_json::json!({ "message": 42 }));
        assert!(saved.get(&good_hash).is_some());
    }
}
