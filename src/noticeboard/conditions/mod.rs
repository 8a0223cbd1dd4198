//! # Display Conditions
//!
//! A notice carries a [`ConditionSet`] describing who should see it and when.
//! Two independent questions are answered on every render pass:
//!
//! 1. **Audience** ([`ConditionChecker`]): does the current request belong to
//!    any of the targeted audiences? Families (`page`, `post_type`, `role`,
//!    `taxonomy`, `user` and their `_not` negations) are alternatives and are
//!    combined with OR. An empty audience matches everyone.
//! 2. **Time** ([`TimeState`]): is the notice due? `later` holds it back
//!    until the given moment. `until` never hides it; it only marks the
//!    notice as removable once it has been shown.
//!
//! ```text
//!   later            until
//!     |                |
//! ----+----------------+---------------->
//! Pending    Active        Expired
//! (hidden)   (shown)       (shown, then deleted unless nag)
//! ```
//!
//! A notice renders iff it is not `Pending` and its audience matches.

mod evaluator;
mod set;
mod time_gate;

pub use evaluator::{ConditionChecker, ScreenConditions};
pub use set::{ConditionSet, ConditionValue, Family, TimeWindow};
pub use time_gate::TimeState;
