//! Audience evaluation.
//!
//! Families are alternative audiences: a notice targeting `page = themes`
//! and `user = 1` shows on the themes screen for anyone, and on any screen
//! for user 1. The families are OR-ed, values within one family are OR-ed
//! too. A negated family (`page_not`, ...) is the complement of its positive
//! predicate and joins the same disjunction.
//!
//! Time is not looked at here. See [`TimeState`](super::TimeState).

use super::set::{ConditionSet, ConditionValue, Family};
use crate::environment::{Environment, Screen};
use std::collections::BTreeSet;

/// Decides whether a notice's audience matches the current request.
pub trait ConditionChecker {
    fn check(&self, conditions: &ConditionSet, env: &dyn Environment) -> bool;
}

impl<F> ConditionChecker for F
where
    F: Fn(&ConditionSet, &dyn Environment) -> bool,
{
    fn check(&self, conditions: &ConditionSet, env: &dyn Environment) -> bool {
        self(conditions, env)
    }
}

/// The default checker, matching against the admin screen and current user.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenConditions;

impl ConditionChecker for ScreenConditions {
    fn check(&self, conditions: &ConditionSet, env: &dyn Environment) -> bool {
        if !conditions.has_audience() {
            return true;
        }

        let screen = env.current_screen().unwrap_or_default();
        conditions
            .families()
            .any(|(family, values)| family_matches(family, values, &screen, env))
    }
}

fn family_matches(
    family: &Family,
    values: &BTreeSet<ConditionValue>,
    screen: &Screen,
    env: &dyn Environment,
) -> bool {
    match family {
        Family::Page => check_page(values, screen),
        Family::PostType => contains_name(values, &screen.post_type),
        Family::Taxonomy => contains_name(values, &screen.taxonomy),
        Family::Role => check_role(values, env),
        Family::User => check_user(values, env),
        Family::PageNot => !check_page(values, screen),
        Family::PostTypeNot => !contains_name(values, &screen.post_type),
        Family::TaxonomyNot => !contains_name(values, &screen.taxonomy),
        Family::RoleNot => !check_role(values, env),
        Family::UserNot => !check_user(values, env),
        Family::Other(name) => {
            tracing::trace!(family = %name, "unknown condition family treated as satisfied");
            true
        }
    }
}

fn contains_name(values: &BTreeSet<ConditionValue>, name: &str) -> bool {
    values.iter().any(|v| v.as_name() == Some(name))
}

fn check_page(values: &BTreeSet<ConditionValue>, screen: &Screen) -> bool {
    screen.pages().iter().any(|page| contains_name(values, page))
}

fn check_role(values: &BTreeSet<ConditionValue>, env: &dyn Environment) -> bool {
    values
        .iter()
        .filter_map(ConditionValue::as_name)
        .any(|role| env.user_can(role))
}

fn check_user(values: &BTreeSet<ConditionValue>, env: &dyn Environment) -> bool {
    values.contains(&ConditionValue::Id(env.current_user_id()))
}
