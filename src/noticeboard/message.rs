//! # Notice Payloads
//!
//! A notice's message is one of three things:
//!
//! - **Text**: a literal string, stored as-is.
//! - **Renderable**: a value of a type implementing [`NoticeKind`]. Its state
//!   is stored as JSON together with the type's stable name, and turned back
//!   into a [`Noticeable`] at render time to produce the text.
//! - **Deferred**: the name of a callback registered on the
//!   [`MessageResolver`], invoked with the notice at render time.
//!
//! Renderables and callbacks are resolved through the manager's
//! [`MessageResolver`]. A stored payload whose type or callback is no longer
//! registered, or whose state no longer deserializes, is reported as
//! [`NoticeError::CorruptedRecord`] for that notice alone.

use crate::error::{NoticeError, Result};
use crate::model::Notice;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Something that can produce notice content on demand.
pub trait Noticeable {
    fn message(&self) -> String;
}

/// A [`Noticeable`] that can be persisted and restored by name.
///
/// `TYPE_NAME` must stay stable across releases: it is what ties stored
/// notices back to the type.
pub trait NoticeKind: Noticeable + Serialize + DeserializeOwned + 'static {
    const TYPE_NAME: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Text {
        text: String,
    },
    Renderable {
        type_name: String,
        state: serde_json::Value,
    },
    Deferred {
        callback: String,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text { text: text.into() }
    }

    pub fn renderable<T: NoticeKind>(value: &T) -> Result<Self> {
        Ok(Message::Renderable {
            type_name: T::TYPE_NAME.to_string(),
            state: serde_json::to_value(value)?,
        })
    }

    pub fn deferred(callback: impl Into<String>) -> Self {
        Message::Deferred {
            callback: callback.into(),
        }
    }

    /// What the dedup hash sees. Renderables contribute their type name,
    /// not their state.
    pub fn identity(&self) -> (&'static str, &str) {
        match self {
            Message::Text { text } => ("text", text),
            Message::Renderable { type_name, .. } => ("renderable", type_name),
            Message::Deferred { callback } => ("deferred", callback),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Message::Text { .. })
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text { text }
    }
}

type Factory = Box<dyn Fn(serde_json::Value) -> serde_json::Result<Box<dyn Noticeable>>>;
type Callback = Box<dyn Fn(&Notice) -> String>;

/// Registry of the renderable types and callbacks a manager can resolve.
#[derive(Default)]
pub struct MessageResolver {
    renderables: HashMap<String, Factory>,
    callbacks: HashMap<String, Callback>,
}

impl fmt::Debug for MessageResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageResolver")
            .field("renderables", &self.renderables.keys().collect::<Vec<_>>())
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MessageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderable<T: NoticeKind>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn with_callback<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Notice) -> String + 'static,
    {
        self.register_callback(name, callback);
        self
    }

    pub fn register<T: NoticeKind>(&mut self) {
        self.renderables.insert(
            T::TYPE_NAME.to_string(),
            Box::new(|state: serde_json::Value| -> serde_json::Result<Box<dyn Noticeable>> {
                let value: T = serde_json::from_value(state)?;
                Ok(Box::new(value) as Box<dyn Noticeable>)
            }),
        );
    }

    pub fn register_callback<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&Notice) -> String + 'static,
    {
        self.callbacks.insert(name.into(), Box::new(callback));
    }

    /// Whether `message` can be resolved by this registry.
    pub fn knows(&self, message: &Message) -> bool {
        match message {
            Message::Text { .. } => true,
            Message::Renderable { type_name, .. } => self.renderables.contains_key(type_name),
            Message::Deferred { callback } => self.callbacks.contains_key(callback),
        }
    }

    /// Produces the final message text for a stored notice.
    pub fn resolve(&self, hash: &str, notice: &Notice) -> Result<String> {
        match notice.message() {
            Message::Text { text } => Ok(text.clone()),
            Message::Renderable { type_name, state } => {
                let factory = self.renderables.get(type_name).ok_or_else(|| {
                    NoticeError::corrupted(
                        hash,
                        format!("renderable type `{}` is not registered", type_name),
                    )
                })?;
                let renderable = factory(state.clone()).map_err(|e| {
                    NoticeError::corrupted(
                        hash,
                        format!("state of `{}` no longer deserializes: {}", type_name, e),
                    )
                })?;
                Ok(renderable.message())
            }
            Message::Deferred { callback } => {
                let f = self.callbacks.get(callback).ok_or_else(|| {
                    NoticeError::corrupted(hash, format!("callback `{}` is not registered", callback))
                })?;
                Ok(f(notice))
            }
        }
    }
}
