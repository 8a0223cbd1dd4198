//! # Domain Model: Notices
//!
//! This module defines [`Notice`], the value object for one queued message,
//! with its [`NoticeType`] and open [`Attributes`] bag.
//!
//! ## Identity and Deduplication
//!
//! A notice is identified by a content hash over four tokens:
//!
//! ```text
//! blake3( type ":" attributes-json ":" conditions-json ":" message-identity-json )
//! ```
//!
//! - Attributes and conditions use ordered maps, so their JSON is canonical.
//! - The message identity is the literal text, the renderable's type name, or
//!   the callback name. Two renderables of the same type with different state
//!   therefore share a hash, and the later one replaces the earlier in the
//!   store.
//!
//! The hash is the storage key: adding an identical notice twice keeps one
//! stored copy. It is computed on first access and cached; every mutation
//! through the crate drops the cache.
//!
//! ## Types
//!
//! `info`, `error`, `warning`, `success`. Unknown type names are not an error:
//! they quietly become `error`, both when adding and when reading stored data.
//!
//! ## Attributes
//!
//! | Key | Kind | Meaning |
//! |-----|------|---------|
//! | `is-dismissible` | bool | Renders a dismiss control |
//! | `is-nag` | bool | Survives expiry; shown on every pass |
//! | `no-wrap` | bool | Message is not wrapped in paragraphs |
//! | `classes` | list | Extra CSS classes |
//!
//! Other keys are carried along untouched for custom renderers.

use crate::conditions::{ConditionSet, TimeState};
use crate::message::Message;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeType {
    Info,
    #[default]
    Error,
    Warning,
    Success,
}

impl NoticeType {
    pub const ALL: [NoticeType; 4] = [
        NoticeType::Info,
        NoticeType::Error,
        NoticeType::Warning,
        NoticeType::Success,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoticeType::Info => "info",
            NoticeType::Error => "error",
            NoticeType::Warning => "warning",
            NoticeType::Success => "success",
        }
    }

    /// Exact, case-sensitive match.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::debug!(requested = %name, "unsupported notice type, using `error`");
            Self::default()
        })
    }
}

impl fmt::Display for NoticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored data may carry types this version does not support.
impl<'de> Deserialize<'de> for NoticeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(NoticeType::parse_or_default(&raw))
    }
}

/// Open key/value bag of display attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, serde_json::Value>);

impl Attributes {
    pub const DISMISSIBLE: &'static str = "is-dismissible";
    pub const NAG: &'static str = "is-nag";
    pub const NO_WRAP: &'static str = "no-wrap";
    pub const CLASSES: &'static str = "classes";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    /// A missing or non-boolean value reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.set(key, value);
    }

    pub fn classes(&self) -> Vec<&str> {
        self.0
            .get(Self::CLASSES)
            .and_then(serde_json::Value::as_array)
            .map(|list| list.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn push_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        let entry = self
            .0
            .entry(Self::CLASSES.to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));

        if !entry.is_array() {
            *entry = serde_json::Value::Array(Vec::new());
        }
        if let serde_json::Value::Array(list) = entry {
            if !list.iter().any(|c| c.as_str() == Some(class.as_str())) {
                list.push(serde_json::Value::String(class));
            }
        }
    }

    /// Fills in keys from `defaults` that are not set here.
    pub fn merge_defaults(&mut self, defaults: &Attributes) {
        for (key, value) in &defaults.0 {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One queued notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    message: Message,
    #[serde(rename = "type", default)]
    notice_type: NoticeType,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    conditions: ConditionSet,
    #[serde(skip)]
    hash: OnceCell<String>,
}

impl Notice {
    pub fn new(message: impl Into<Message>, notice_type: NoticeType) -> Self {
        Self {
            message: message.into(),
            notice_type,
            attributes: Attributes::new(),
            conditions: ConditionSet::new(),
            hash: OnceCell::new(),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn notice_type(&self) -> NoticeType {
        self.notice_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        self.hash.take();
        &mut self.attributes
    }

    pub(crate) fn conditions_mut(&mut self) -> &mut ConditionSet {
        self.hash.take();
        &mut self.conditions
    }

    /// Fixed-length hex digest; the storage and dedup key.
    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| self.compute_hash())
    }

    fn compute_hash(&self) -> String {
        let tokens = [
            self.notice_type.as_str().to_string(),
            canonical_json(&self.attributes),
            canonical_json(&self.conditions),
            canonical_json(&self.message.identity()),
        ];
        blake3::hash(tokens.join(":").as_bytes()).to_hex().to_string()
    }

    pub fn is_nag(&self) -> bool {
        self.attributes.flag(Attributes::NAG)
    }

    pub fn is_dismissible(&self) -> bool {
        self.attributes.flag(Attributes::DISMISSIBLE)
    }

    pub fn is_wrapped(&self) -> bool {
        !self.attributes.flag(Attributes::NO_WRAP)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes.classes()
    }

    pub fn has_time_conditions(&self) -> bool {
        self.conditions.has_time_conditions()
    }

    pub fn should_be_shown_later(&self, now: i64) -> bool {
        self.conditions.should_be_shown_later(now)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.conditions.is_expired(now)
    }

    pub fn time_state(&self, now: i64) -> TimeState {
        self.conditions.time_state(now)
    }
}

// Ordered maps with string keys; serialization cannot fail.
fn canonical_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
