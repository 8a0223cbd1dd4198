//! # Storage Layer
//!
//! Notices persist as one blob per storage key. Two layers split the work:
//!
//! - [`StorageBackend`]: the "where". A string-keyed slot store with
//!   `get`/`set`/`delete`, nothing more.
//! - [`NoticeStore`]: the "what". Boots the working set for one key, dedups
//!   by hash, and writes it back exactly once at the end of its scope.
//!
//! ## Implementations
//!
//! - [`MemBackend`]: in-memory slots for tests, with error simulation
//! - [`FsBackend`]: one `{key}.json` file per key, written atomically
//!
//! ## Lifecycle
//!
//! ```text
//! open(key) ──> add / delete / flush ──> close()
//!    │                                      │
//!    └─ missing slot = empty store          └─ save, unless flushed
//! ```
//!
//! There is no locking. Two processes booting the same key each work on
//! their own copy, and the last `close` overwrites the other.
//!
//! ## Blob Format
//!
//! A JSON object from hash to notice, in insertion order:
//!
//! ```text
//! {
//!   "9f86d0...": { "message": {...}, "type": "info", "attributes": {...}, "conditions": {...} },
//!   ...
//! }
//! ```
//!
//! Entries that no longer parse are kept as raw JSON and reported, never
//! silently dropped.

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod notice_store;

pub use backend::StorageBackend;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use notice_store::NoticeStore;
