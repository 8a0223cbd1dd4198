//! # Noticeboard Architecture
//!
//! Noticeboard queues admin notices, decides *whether* and *when* each one
//! shows, renders the eligible ones, and cleans up after them. It does not
//! deliver anything anywhere: a host hands it messages and asks it to render
//! once per page view.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Registry (registry.rs)                                     │
//! │  - One Manager per name, owned by the application           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager (manager.rs) + PendingNotice (pending.rs)          │
//! │  - Builds notices fluently, commits them explicitly         │
//! │  - Runs render passes and post-render deletion              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Decisions (conditions/)                                    │
//! │  - Audience: page, post type, role, taxonomy, user (OR-ed)  │
//! │  - Time gate: pending / active / expired                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - NoticeStore: boot once, dedup by hash, commit once       │
//! │  - StorageBackend: MemBackend (testing), FsBackend          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Gate vs. Audience
//!
//! Time restricts *when*, the other families restrict *to whom*. A notice
//! that is not due yet is never rendered, whoever is looking. Once due, the
//! audience alone decides. An `until` bound never hides a notice; it only
//! lets the manager delete it after a render.
//!
//! ## Explicit Lifetimes
//!
//! Nothing happens implicitly at scope end:
//!
//! - a [`PendingNotice`] is stored only by [`PendingNotice::commit`]
//! - a [`NoticeStore`] writes back only on [`NoticeStore::close`] (or
//!   through [`NoticeStore::with_scope`])
//!
//! Dropping either without finishing it discards the work; a dropped store
//! logs a warning.
//!
//! ## Host Collaborators
//!
//! - [`Environment`]: current screen, user and capability checks
//! - [`StorageBackend`]: string-keyed blob slots
//! - [`Renderer`]: turns an eligible notice into output
//!
//! ## Logging
//!
//! Events go through [`tracing`]. The library never installs a subscriber.
//!
//! ## Module Overview
//!
//! - [`manager`]: render passes and notice creation
//! - [`pending`]: the fluent builder
//! - [`conditions`]: condition sets, evaluation and time gating
//! - [`model`]: `Notice`, `NoticeType`, `Attributes`
//! - [`message`]: text, renderable and deferred payloads
//! - [`store`]: persistence
//! - [`render`]: renderers, including HTML output
//! - [`registry`]: named managers
//! - [`time`]: time expressions and clocks
//! - [`environment`]: the host's view of the current request
//! - [`str_case`]: identifier case conversion and storage keys
//! - [`config`]: configuration
//! - [`error`]: error types

pub mod conditions;
pub mod config;
pub mod environment;
pub mod error;
pub mod manager;
pub mod message;
pub mod model;
pub mod pending;
pub mod registry;
pub mod render;
pub mod store;
pub mod str_case;
pub mod time;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use conditions::{ConditionChecker, ConditionSet, ScreenConditions, TimeState};
pub use config::NoticeConfig;
pub use environment::{Environment, EnvironmentSnapshot, Screen};
pub use error::{NoticeError, Result};
pub use manager::{Manager, RenderReport};
pub use message::{Message, MessageResolver, NoticeKind, Noticeable};
pub use model::{Attributes, Notice, NoticeType};
pub use pending::PendingNotice;
pub use registry::Registry;
pub use render::{HtmlRenderer, RenderContext, Renderer};
pub use store::{FsBackend, MemBackend, NoticeStore, StorageBackend};
pub use time::{Clock, ManualClock, SystemClock, TimeValue};
