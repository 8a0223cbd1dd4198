use super::backend::StorageBackend;
use crate::error::{NoticeError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since notice handling is
/// single-threaded. This avoids the overhead of `RwLock` while still allowing
/// the `StorageBackend` trait to use `&self` for all methods.
#[derive(Debug, Default)]
pub struct MemBackend {
    slots: RefCell<HashMap<String, String>>,
    simulate_write_error: Cell<bool>,
    simulate_read_error: Cell<bool>,
    writes: Cell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.set(simulate);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Test helper: raw access to a slot's blob.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    /// Test helper: plant a blob directly.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.borrow().contains_key(key)
    }
}

impl StorageBackend for MemBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.simulate_read_error.get() {
            return Err(NoticeError::Backend("Simulated read error".to_string()));
        }
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<bool> {
        if self.simulate_write_error.get() {
            return Err(NoticeError::Backend("Simulated write error".to_string()));
        }
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        if self.simulate_write_error.get() {
            return Err(NoticeError::Backend("Simulated write error".to_string()));
        }
        Ok(self.slots.borrow_mut().remove(key).is_some())
    }
}
