use crate::error::Result;
use std::rc::Rc;

/// Abstract interface for the key-value slot notices persist into.
///
/// This trait handles the "where" of storage (memory, files, a host options
/// table), while [`NoticeStore`](super::NoticeStore) handles the "what"
/// (boot, dedup, commit).
///
/// Values are opaque serialized blobs. Implementations take `&self` and use
/// interior mutability where needed, so one backend can serve several named
/// stores.
pub trait StorageBackend {
    /// Read the blob under `key`. `Ok(None)` when the slot does not exist.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the slot as a whole. Returns whether a write happened.
    fn set(&self, key: &str, value: &str) -> Result<bool>;

    /// Remove the slot. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<bool> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<bool> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }
}
