//! # Host Environment
//!
//! Condition evaluation needs to know where the current request is (the admin
//! screen) and who is making it (user id and capabilities). The host provides
//! this through the [`Environment`] trait; the library never looks it up on
//! its own.
//!
//! When the host has no active admin context, `current_screen` returns `None`
//! and evaluation falls back to an all-empty [`Screen`].
//!
//! [`EnvironmentSnapshot`] is a plain-data implementation: hosts can fill one
//! per request, and tests use it to describe a fixed screen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The admin screen the current request renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub base: String,
    pub parent_base: String,
    pub parent_file: String,
    pub post_type: String,
    pub taxonomy: String,
}

impl Screen {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_base: impl Into<String>, parent_file: impl Into<String>) -> Self {
        self.parent_base = parent_base.into();
        self.parent_file = parent_file.into();
        self
    }

    pub fn with_post_type(mut self, post_type: impl Into<String>) -> Self {
        self.post_type = post_type.into();
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: impl Into<String>) -> Self {
        self.taxonomy = taxonomy.into();
        self
    }

    /// Every name a `page` condition may match against.
    pub fn pages(&self) -> [&str; 3] {
        [&self.base, &self.parent_base, &self.parent_file]
    }
}

/// Lookups the host must answer for condition evaluation.
pub trait Environment {
    fn current_screen(&self) -> Option<Screen>;

    /// `0` when nobody is logged in.
    fn current_user_id(&self) -> u64;

    /// Whether the current user holds a role or capability.
    fn user_can(&self, capability: &str) -> bool;

    fn role_exists(&self, _role: &str) -> bool {
        true
    }

    fn post_type_exists(&self, _post_type: &str) -> bool {
        true
    }

    fn taxonomy_exists(&self, _taxonomy: &str) -> bool {
        true
    }
}

/// A fixed description of the current request.
///
/// `known_*` sets restrict the existence checks; `None` means everything
/// exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub screen: Option<Screen>,
    pub user_id: u64,
    pub capabilities: BTreeSet<String>,
    /// Grants every capability check, like a super admin.
    #[serde(default)]
    pub all_capabilities: bool,
    pub known_roles: Option<BTreeSet<String>>,
    pub known_post_types: Option<BTreeSet<String>>,
    pub known_taxonomies: Option<BTreeSet<String>>,
}

impl EnvironmentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(mut self, screen: Screen) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_all_capabilities(mut self) -> Self {
        self.all_capabilities = true;
        self
    }

    pub fn with_known_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_known_post_types<I, S>(mut self, post_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_post_types = Some(post_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_known_taxonomies<I, S>(mut self, taxonomies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_taxonomies = Some(taxonomies.into_iter().map(Into::into).collect());
        self
    }
}

fn known(set: &Option<BTreeSet<String>>, name: &str) -> bool {
    set.as_ref().map_or(true, |names| names.contains(name))
}

impl Environment for EnvironmentSnapshot {
    fn current_screen(&self) -> Option<Screen> {
        self.screen.clone()
    }

    fn current_user_id(&self) -> u64 {
        self.user_id
    }

    fn user_can(&self, capability: &str) -> bool {
        self.all_capabilities || self.capabilities.contains(capability)
    }

    fn role_exists(&self, role: &str) -> bool {
        known(&self.known_roles, role)
    }

    fn post_type_exists(&self, post_type: &str) -> bool {
        known(&self.known_post_types, post_type)
    }

    fn taxonomy_exists(&self, taxonomy: &str) -> bool {
        known(&self.known_taxonomies, taxonomy)
    }
}
