//! Fluent construction of a notice before it is stored.
//!
//! A [`PendingNotice`] borrows its [`Manager`] mutably and stores nothing
//! until [`commit`](PendingNotice::commit) is called:
//!
//! ```ignore
//! manager
//!     .warning("Your licence expires soon")?
//!     .dismissible(true)
//!     .show_when_page(["plugins", "dashboard"])
//!     .show_until("+1 week")?
//!     .commit();
//! ```

use crate::conditions::{ConditionValue, Family};
use crate::environment::Environment;
use crate::error::Result;
use crate::manager::Manager;
use crate::model::{Attributes, Notice};
use crate::store::StorageBackend;
use crate::time::{self, TimeValue};

/// CSS class added by [`PendingNotice::as_alternative`].
pub const ALTERNATIVE_CLASS: &str = "notice-alt";

#[must_use = "a pending notice is only stored once `commit` is called"]
pub struct PendingNotice<'a, B: StorageBackend> {
    manager: &'a mut Manager<B>,
    notice: Notice,
}

impl<'a, B: StorageBackend> PendingNotice<'a, B> {
    pub(crate) fn new(manager: &'a mut Manager<B>, notice: Notice) -> Self {
        Self { manager, notice }
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    pub fn hash(&self) -> &str {
        self.notice.hash()
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.notice
            .attributes_mut()
            .set_flag(Attributes::DISMISSIBLE, dismissible);
        self
    }

    /// Nag notices survive expiry and show on every pass.
    pub fn nag(mut self, nag: bool) -> Self {
        self.notice.attributes_mut().set_flag(Attributes::NAG, nag);
        self
    }

    /// The alternate, background-filled notice style.
    pub fn as_alternative(self) -> Self {
        self.with_class(ALTERNATIVE_CLASS)
    }

    pub fn without_wrapping(mut self) -> Self {
        self.notice
            .attributes_mut()
            .set_flag(Attributes::NO_WRAP, true);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.notice.attributes_mut().push_class(class);
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.notice.attributes_mut().set(key, value);
        self
    }

    /// Matches the current screen's base, parent base or parent file.
    pub fn show_when_page<I, S>(self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::Page, names(pages), |_, _| true)
    }

    /// Post types the host does not know are dropped.
    pub fn show_when_post_type<I, S>(self, post_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::PostType, names(post_types), |env, name| {
            env.post_type_exists(name)
        })
    }

    /// Roles the host does not know are dropped.
    pub fn show_when_role<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::Role, names(roles), |env, name| env.role_exists(name))
    }

    /// Taxonomies the host does not know are dropped.
    pub fn show_when_taxonomy<I, S>(self, taxonomies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::Taxonomy, names(taxonomies), |env, name| {
            env.taxonomy_exists(name)
        })
    }

    pub fn show_when_user<I>(self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.condition(Family::User, user_ids, |_, _| true)
    }

    pub fn hide_when_page<I, S>(self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::PageNot, names(pages), |_, _| true)
    }

    pub fn hide_when_post_type<I, S>(self, post_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::PostTypeNot, names(post_types), |_, _| true)
    }

    pub fn hide_when_role<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::RoleNot, names(roles), |_, _| true)
    }

    pub fn hide_when_taxonomy<I, S>(self, taxonomies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition(Family::TaxonomyNot, names(taxonomies), |_, _| true)
    }

    pub fn hide_when_user<I>(self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.condition(Family::UserNot, user_ids, |_, _| true)
    }

    /// Holds the notice back until `when`.
    pub fn show_later(mut self, when: impl Into<TimeValue>) -> Result<Self> {
        let timestamp = time::to_timestamp(when, self.manager.now())?;
        self.notice.conditions_mut().set_later(timestamp);
        Ok(self)
    }

    /// Lets the notice be deleted once rendered after `when`. It does not
    /// stop rendering.
    pub fn show_until(mut self, when: impl Into<TimeValue>) -> Result<Self> {
        let timestamp = time::to_timestamp(when, self.manager.now())?;
        self.notice.conditions_mut().set_until(timestamp);
        Ok(self)
    }

    /// Stores the notice and returns its hash. An identical notice already
    /// in the store is replaced.
    pub fn commit(self) -> String {
        self.manager.store_mut().add(self.notice)
    }

    /// Gives up the notice without storing it.
    pub fn into_notice(self) -> Notice {
        self.notice
    }

    fn condition<I, S, F>(mut self, family: Family, values: I, exists: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConditionValue>,
        F: Fn(&dyn Environment, &str) -> bool,
    {
        let values: Vec<ConditionValue> = values.into_iter().map(Into::into).collect();
        let supplied = !values.is_empty();

        let env = self.manager.environment();
        let kept: Vec<ConditionValue> = values
            .into_iter()
            .filter(|value| exists(env, &value.to_string()))
            .collect();

        self.notice
            .conditions_mut()
            .extend(family, supplied, kept);
        self
    }
}

fn names<I, S>(values: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into)
}
