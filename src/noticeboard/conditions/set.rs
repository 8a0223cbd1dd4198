//! The condition set attached to a notice.
//!
//! Audience conditions are grouped by [`Family`]; each family holds a set of
//! values that accumulates across builder calls. Time conditions live in a
//! separate [`TimeWindow`] because they gate *when* a notice shows, not *to
//! whom*.
//!
//! Both maps are ordered (`BTreeMap` / `BTreeSet`) so the serialized form is
//! canonical: equal condition sets always hash the same.

use super::time_gate::TimeState;
use crate::str_case;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A named audience predicate category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Family {
    Page,
    PostType,
    Role,
    Taxonomy,
    User,
    PageNot,
    PostTypeNot,
    RoleNot,
    TaxonomyNot,
    UserNot,
    /// A family this version does not know. Always satisfied.
    Other(String),
}

impl Family {
    pub fn parse(name: &str) -> Self {
        match str_case::snake(name).as_str() {
            "page" => Family::Page,
            "post_type" => Family::PostType,
            "role" => Family::Role,
            "taxonomy" => Family::Taxonomy,
            "user" => Family::User,
            "page_not" => Family::PageNot,
            "post_type_not" => Family::PostTypeNot,
            "role_not" => Family::RoleNot,
            "taxonomy_not" => Family::TaxonomyNot,
            "user_not" => Family::UserNot,
            _ => Family::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Family::Page => "page",
            Family::PostType => "post_type",
            Family::Role => "role",
            Family::Taxonomy => "taxonomy",
            Family::User => "user",
            Family::PageNot => "page_not",
            Family::PostTypeNot => "post_type_not",
            Family::RoleNot => "role_not",
            Family::TaxonomyNot => "taxonomy_not",
            Family::UserNot => "user_not",
            Family::Other(name) => name,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Family {
    fn from(name: String) -> Self {
        Family::parse(&name)
    }
}

impl From<Family> for String {
    fn from(family: Family) -> Self {
        family.name().to_string()
    }
}

/// A single condition value: a user id or a name (page, role, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Id(u64),
    Name(String),
}

impl ConditionValue {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ConditionValue::Name(name) => Some(name),
            ConditionValue::Id(_) => None,
        }
    }

    pub fn as_id(&self) -> Option<u64> {
        match self {
            ConditionValue::Id(id) => Some(*id),
            ConditionValue::Name(_) => None,
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Id(id) => write!(f, "{}", id),
            ConditionValue::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for ConditionValue {
    fn from(id: u64) -> Self {
        ConditionValue::Id(id)
    }
}

impl From<&str> for ConditionValue {
    fn from(name: &str) -> Self {
        ConditionValue::Name(name.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(name: String) -> Self {
        ConditionValue::Name(name)
    }
}

/// Optional display window, as Unix timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub later: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSet {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    families: BTreeMap<Family, BTreeSet<ConditionValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<TimeWindow>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// No audience family and no time window.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty() && self.time.is_none()
    }

    /// No audience family; a time window may still be present.
    pub fn has_audience(&self) -> bool {
        !self.families.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = (&Family, &BTreeSet<ConditionValue>)> {
        self.families.iter()
    }

    pub fn values(&self, family: &Family) -> Option<&BTreeSet<ConditionValue>> {
        self.families.get(family)
    }

    /// Unions `values` into `family`.
    ///
    /// `supplied` says whether the caller passed anything at all: the family
    /// key is created only then, even if every value was filtered out before
    /// reaching this call.
    pub(crate) fn extend<I>(&mut self, family: Family, supplied: bool, values: I)
    where
        I: IntoIterator<Item = ConditionValue>,
    {
        if !supplied {
            return;
        }
        self.families.entry(family).or_default().extend(values);
    }

    pub fn time(&self) -> Option<&TimeWindow> {
        self.time.as_ref()
    }

    pub fn has_time_conditions(&self) -> bool {
        self.time.is_some()
    }

    pub(crate) fn set_later(&mut self, timestamp: i64) {
        self.time.get_or_insert_with(TimeWindow::default).later = Some(timestamp);
    }

    pub(crate) fn set_until(&mut self, timestamp: i64) {
        self.time.get_or_insert_with(TimeWindow::default).until = Some(timestamp);
    }

    pub fn time_state(&self, now: i64) -> TimeState {
        TimeState::of(self.time.as_ref(), now)
    }

    /// Not due yet: a `later` bound exists and lies in the future.
    pub fn should_be_shown_later(&self, now: i64) -> bool {
        self.time_state(now).is_pending()
    }

    /// Due and past the `until` bound. A notice without `until` counts as
    /// expired, so it is removed after its first render.
    pub fn is_expired(&self, now: i64) -> bool {
        self.time_state(now).is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<ConditionValue> {
        values.iter().map(|v| ConditionValue::from(*v)).collect()
    }

    #[test]
    fn test_family_parse_normalizes_case() {
        assert_eq!(Family::parse("post-type"), Family::PostType);
        assert_eq!(Family::parse("PostType"), Family::PostType);
        assert_eq!(Family::parse("page_not"), Family::PageNot);
        assert_eq!(
            Family::parse("moon_phase"),
            Family::Other("moon_phase".to_string())
        );
    }

    #[test]
    fn test_extend_unions_values() {
        let mut set = ConditionSet::new();
        set.extend(Family::Page, true, names(&["tools", "themes"]));
        set.extend(Family::Page, true, names(&["tools", "plugins"]));

        let pages = set.values(&Family::Page).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages.contains(&ConditionValue::from("plugins")));
    }

    #[test]
    fn test_family_key_only_exists_when_supplied() {
        let mut set = ConditionSet::new();
        set.extend(Family::Role, false, Vec::new());
        assert!(set.is_empty());

        // Supplied but entirely filtered out: the key stays, with no values.
        set.extend(Family::Role, true, Vec::new());
        assert!(set.has_audience());
        assert!(set.values(&Family::Role).unwrap().is_empty());
    }

    #[test]
    fn test_time_window_is_not_an_audience() {
        let mut set = ConditionSet::new();
        set.set_later(100);
        assert!(!set.is_empty());
        assert!(!set.has_audience());
        assert!(set.has_time_conditions());
    }

    #[test]
    fn test_should_be_shown_later() {
        let mut set = ConditionSet::new();
        assert!(!set.should_be_shown_later(50));
        set.set_later(100);
        assert!(set.should_be_shown_later(99));
        assert!(!set.should_be_shown_later(100));
    }

    #[test]
    fn test_is_expired_defaults_to_true_without_until() {
        let mut set = ConditionSet::new();
        assert!(set.is_expired(0));
        assert_eq!(set.time_state(0), TimeState::Expired);
        set.set_until(100);
        assert!(!set.is_expired(100));
        assert!(set.is_expired(101));
    }

    #[test]
    fn test_serialized_shape() {
        let mut set = ConditionSet::new();
        set.extend(Family::PostType, true, names(&["post"]));
        set.extend(Family::User, true, [ConditionValue::Id(7)]);
        set.set_until(200);

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "families": { "post_type": ["post"], "user": [7] },
                "time": { "until": 200 }
            })
        );

        let back: ConditionSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_unknown_family_survives_deserialization() {
        let json = serde_json::json!({ "families": { "moon_phase": ["full"] } });
        let set: ConditionSet = serde_json::from_value(json).unwrap();
        assert!(set
            .values(&Family::Other("moon_phase".to_string()))
            .is_some());
    }
}
