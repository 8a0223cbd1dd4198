use crate::config::NoticeConfig;
use crate::environment::{EnvironmentSnapshot, Screen};
use crate::manager::Manager;
use crate::registry::Registry;
use crate::store::{MemBackend, NoticeStore};
use crate::time::{Clock, ManualClock};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::rc::Rc;

/// Shared fixtures: an in-memory backend, a stopped clock, and the admin
/// "tools" screen with user 1 holding every capability.
pub struct TestEnv {
    pub backend: Rc<MemBackend>,
    pub clock: Rc<ManualClock>,
    pub environment: Rc<EnvironmentSnapshot>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            backend: Rc::new(MemBackend::new()),
            clock: Rc::new(ManualClock::new(Self::epoch())),
            environment: Rc::new(Self::snapshot()),
        }
    }

    /// 2024-03-15 10:30:00 UTC, a Friday.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0)
            .single()
            .expect("valid fixture date")
    }

    pub fn screen() -> Screen {
        Screen::new("tools")
            .with_parent("tools", "tools.php")
            .with_post_type("post")
            .with_taxonomy("category")
    }

    pub fn snapshot() -> EnvironmentSnapshot {
        EnvironmentSnapshot::new()
            .with_screen(Self::screen())
            .with_user(1)
            .with_all_capabilities()
    }

    pub fn with_environment(mut self, environment: EnvironmentSnapshot) -> Self {
        self.environment = Rc::new(environment);
        self
    }

    /// A manager over `key`, wired to this environment's backend and clock.
    pub fn manager(&self, key: &str) -> Manager<Rc<MemBackend>> {
        let store = NoticeStore::open(self.backend.clone(), key).expect("memory store boots");
        Manager::new(store)
            .with_clock(self.clock.clone())
            .with_environment(self.environment.clone())
    }

    pub fn registry(&self, config: NoticeConfig) -> Registry<Rc<MemBackend>> {
        Registry::new(self.backend.clone(), config)
            .with_clock(self.clock.clone())
            .with_environment(self.environment.clone())
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn now(&self) -> i64 {
        self.clock.now().timestamp()
    }
}
