use super::set::TimeWindow;
use serde::Serialize;

/// Where a notice stands relative to its time window.
///
/// `Pending` suppresses rendering outright. `Active` and `Expired` both
/// render; `Expired` additionally makes the notice eligible for deletion
/// once it has been shown. Without an `until` bound a due notice is
/// `Expired`: nothing keeps it around after its first render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeState {
    Pending,
    Active,
    Expired,
}

impl TimeState {
    pub fn of(window: Option<&TimeWindow>, now: i64) -> Self {
        let (later, until) = window.map_or((None, None), |w| (w.later, w.until));

        if later.is_some_and(|later| now < later) {
            return TimeState::Pending;
        }

        match until {
            Some(until) if now <= until => TimeState::Active,
            _ => TimeState::Expired,
        }
    }

    pub fn is_pending(self) -> bool {
        self == TimeState::Pending
    }

    pub fn is_expired(self) -> bool {
        self == TimeState::Expired
    }
}
