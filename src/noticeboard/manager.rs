//! # Notice Manager
//!
//! The [`Manager`] owns one [`NoticeStore`] and runs render passes over it.
//!
//! ## Render Pass
//!
//! For every stored entry, in insertion order:
//!
//! ```text
//!                  ┌──────────────┐
//!   entry ────────>│ readable?    │── no ──> failure (CorruptedRecord), kept
//!                  └──────┬───────┘
//!                         │
//!                  ┌──────▼───────┐
//!                  │ time pending │── yes ─> skipped (pending)
//!                  └──────┬───────┘
//!                         │
//!                  ┌──────▼───────┐
//!                  │ audience ok? │── no ──> skipped (filtered)
//!                  └──────┬───────┘
//!                         │
//!                  ┌──────▼───────┐
//!                  │ resolve +    │── err ─> failure, kept
//!                  │ render       │
//!                  └──────┬───────┘
//!                         │
//!           expired and (not nag or nag ignored)?
//!                   yes ──> deleted
//! ```
//!
//! A failure never stops the pass; the remaining entries are still handled.
//! Everything that happened is returned as a [`RenderReport`].
//!
//! ## Lifetime
//!
//! Nothing reaches the backend until [`Manager::close`] (or
//! [`Manager::flush`], which removes the slot instead).

use crate::conditions::{ConditionChecker, ScreenConditions};
use crate::config::NoticeConfig;
use crate::environment::{Environment, EnvironmentSnapshot};
use crate::error::{NoticeError, Result};
use crate::message::{Message, MessageResolver};
use crate::model::{Attributes, Notice, NoticeType};
use crate::pending::PendingNotice;
use crate::render::{RenderContext, Renderer};
use crate::store::{NoticeStore, StorageBackend};
use crate::time::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use std::rc::Rc;

/// Outcome of one render pass, by hash.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub rendered: Vec<String>,
    /// Not due yet.
    pub pending: Vec<String>,
    /// Audience did not match.
    pub filtered: Vec<String>,
    /// Removed from the store after rendering.
    pub deleted: Vec<String>,
    pub failures: Vec<(String, NoticeError)>,
}

impl RenderReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Manager<B: StorageBackend> {
    store: NoticeStore<B>,
    checker: Box<dyn ConditionChecker>,
    resolver: Rc<MessageResolver>,
    environment: Rc<dyn Environment>,
    clock: Rc<dyn Clock>,
    defaults: Attributes,
    ignore_nag: bool,
}

impl<B: StorageBackend> Manager<B> {
    /// A manager with the screen checker, an empty environment and the
    /// system clock.
    pub fn new(store: NoticeStore<B>) -> Self {
        Self {
            store,
            checker: Box::new(ScreenConditions),
            resolver: Rc::new(MessageResolver::new()),
            environment: Rc::new(EnvironmentSnapshot::new()),
            clock: Rc::new(SystemClock),
            defaults: Attributes::new(),
            ignore_nag: false,
        }
    }

    pub fn from_config(store: NoticeStore<B>, config: &NoticeConfig) -> Self {
        let manager = Self::new(store).ignore_nag(config.disable_nag_notices);
        if config.without_wrapping {
            manager.without_wrapping()
        } else {
            manager
        }
    }

    /// Boots the store under `key` and applies `config`.
    pub fn open(backend: B, key: impl Into<String>, config: &NoticeConfig) -> Result<Self> {
        let store = NoticeStore::open(backend, key)?;
        Ok(Self::from_config(store, config))
    }

    pub fn with_environment(mut self, environment: Rc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_resolver(mut self, resolver: Rc<MessageResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the default screen-based checker, e.g. for front-end pages.
    pub fn resolve_conditions(mut self, checker: impl ConditionChecker + 'static) -> Self {
        self.checker = Box::new(checker);
        self
    }

    /// Every notice created from now on defaults to `no-wrap`.
    pub fn without_wrapping(mut self) -> Self {
        self.defaults.set_flag(Attributes::NO_WRAP, true);
        self
    }

    /// When on, nag notices are deleted after render like any other.
    pub fn ignore_nag(mut self, ignore: bool) -> Self {
        self.ignore_nag = ignore;
        self
    }

    pub fn set_environment(&mut self, environment: Rc<dyn Environment>) {
        self.environment = environment;
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    pub fn resolver(&self) -> &MessageResolver {
        &self.resolver
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &NoticeStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoticeStore<B> {
        &mut self.store
    }

    /// Starts a notice. Unsupported type names fall back to `error`.
    ///
    /// Fails with [`NoticeError::InvalidArgument`] when the message names a
    /// renderable type or callback this manager cannot resolve.
    pub fn add(&mut self, message: impl Into<Message>, kind: &str) -> Result<PendingNotice<'_, B>> {
        let message = message.into();
        if !self.resolver.knows(&message) {
            let (_, name) = message.identity();
            return Err(NoticeError::InvalidArgument(format!(
                "`{}` is neither text nor a registered renderable or callback",
                name
            )));
        }

        let mut notice = Notice::new(message, NoticeType::parse_or_default(kind));
        notice.attributes_mut().merge_defaults(&self.defaults);
        Ok(PendingNotice::new(self, notice))
    }

    pub fn info(&mut self, message: impl Into<Message>) -> Result<PendingNotice<'_, B>> {
        self.add(message, NoticeType::Info.as_str())
    }

    pub fn error(&mut self, message: impl Into<Message>) -> Result<PendingNotice<'_, B>> {
        self.add(message, NoticeType::Error.as_str())
    }

    pub fn warning(&mut self, message: impl Into<Message>) -> Result<PendingNotice<'_, B>> {
        self.add(message, NoticeType::Warning.as_str())
    }

    pub fn success(&mut self, message: impl Into<Message>) -> Result<PendingNotice<'_, B>> {
        self.add(message, NoticeType::Success.as_str())
    }

    /// One render pass against the manager's own environment.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> RenderReport {
        let environment = Rc::clone(&self.environment);
        self.render_with(environment.as_ref(), renderer)
    }

    /// One render pass against `environment`.
    pub fn render_with(
        &mut self,
        environment: &dyn Environment,
        renderer: &mut dyn Renderer,
    ) -> RenderReport {
        let now = self.clock.timestamp();
        let mut report = RenderReport::default();

        for hash in self.store.hashes() {
            let Some(notice) = self.store.get(&hash) else {
                if let Some(reason) = self.store.corruption(&hash) {
                    let err = NoticeError::corrupted(&hash, reason);
                    tracing::warn!(hash = %hash, error = %err, "skipping unreadable notice");
                    report.failures.push((hash, err));
                }
                continue;
            };

            let state = notice.time_state(now);
            if state.is_pending() {
                report.pending.push(hash);
                continue;
            }

            if !self.checker.check(notice.conditions(), environment) {
                report.filtered.push(hash);
                continue;
            }

            let message = match self.resolver.resolve(&hash, notice) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(hash = %hash, error = %err, "notice message did not resolve");
                    report.failures.push((hash, err));
                    continue;
                }
            };

            let ctx = RenderContext {
                hash: &hash,
                notice,
                message: &message,
            };
            if let Err(err) = renderer.render(&ctx) {
                tracing::warn!(hash = %hash, error = %err, "renderer failed");
                report.failures.push((hash, err));
                continue;
            }

            let deletable = state.is_expired() && (self.ignore_nag || !notice.is_nag());
            if deletable {
                self.store.delete(&hash);
                report.deleted.push(hash.clone());
            }
            report.rendered.push(hash);
        }

        tracing::debug!(
            key = %self.store.key(),
            rendered = report.rendered.len(),
            pending = report.pending.len(),
            filtered = report.filtered.len(),
            deleted = report.deleted.len(),
            failed = report.failures.len(),
            "render pass finished"
        );
        report
    }

    /// Removes the backing slot now; the final commit is skipped.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// Commits the store.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionSet;
    use crate::message::{NoticeKind, Noticeable};
    use crate::render::HtmlRenderer;
    use crate::store::MemBackend;
    use crate::test_utils::TestEnv;
    use chrono::Duration;
    use serde::{Deserialize, Serialize};

    const KEY: &str = "manager_test";

    #[test]
    fn test_unknown_type_falls_back_to_error() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        let notice = m.add("x", "update").unwrap().into_notice();
        assert_eq!(notice.notice_type(), NoticeType::Error);
        m.close().unwrap();
    }

    #[test]
    fn test_unregistered_renderable_is_invalid_argument() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        let result = m.info(Message::deferred("nobody"));
        assert!(matches!(result, Err(NoticeError::InvalidArgument(_))));
        m.close().unwrap();
    }

    #[test]
    fn test_plain_notice_renders_once_then_is_deleted() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        let hash = m.info("Saved").unwrap().commit();

        let mut html = HtmlRenderer::new();
        let report = m.render(&mut html);
        assert_eq!(report.rendered, vec![hash.clone()]);
        assert_eq!(report.deleted, vec![hash]);
        assert!(html.output().contains("Saved"));

        let second = m.render(&mut html);
        assert!(second.rendered.is_empty());
        m.close().unwrap();
    }

    #[test]
    fn test_nag_survives_unless_ignored() {
        let env = TestEnv::new();

        let mut m = env.manager(KEY);
        let hash = m.warning("Update available").unwrap().nag(true).commit();
        let mut html = HtmlRenderer::new();
        for _ in 0..3 {
            let report = m.render(&mut html);
            assert_eq!(report.rendered, vec![hash.clone()]);
            assert!(report.deleted.is_empty());
        }
        m.close().unwrap();

        let mut ignoring = env.manager(KEY).ignore_nag(true);
        let report = ignoring.render(&mut html);
        assert_eq!(report.deleted, vec![hash]);
        ignoring.close().unwrap();
    }

    #[test]
    fn test_audience_filter_keeps_notice() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        let hash = m.info("Themes only").unwrap().show_when_page(["themes"]).commit();

        let report = m.render(&mut HtmlRenderer::new());
        assert_eq!(report.filtered, vec![hash.clone()]);
        assert!(m.store().has(&hash));
        m.close().unwrap();
    }

    #[test]
    fn test_show_later_waits_for_clock() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        let hash = m.info("Soon").unwrap().show_later(Duration::seconds(1)).unwrap().commit();

        let mut html = HtmlRenderer::new();
        assert_eq!(m.render(&mut html).pending, vec![hash.clone()]);

        env.advance(Duration::seconds(1));
        let report = m.render(&mut html);
        assert_eq!(report.rendered, vec![hash.clone()]);
        assert_eq!(report.deleted, vec![hash.clone()]);
        assert!(!m.store().has(&hash));
        m.close().unwrap();
    }

    #[test]
    fn test_renderer_failure_is_isolated() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        let bad = m.error("bad").unwrap().commit();
        let good = m.info("good").unwrap().commit();

        let mut renderer = |ctx: &RenderContext<'_>| -> Result<()> {
            if ctx.message == "bad" {
                Err(NoticeError::Render("template missing".to_string()))
            } else {
                Ok(())
            }
        };
        let report = m.render(&mut renderer);

        assert_eq!(report.rendered, vec![good]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, bad);
        assert!(m.store().has(&bad));
        m.close().unwrap();
    }

    #[test]
    fn test_custom_checker_replaces_screen_rules() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY)
            .resolve_conditions(|_: &ConditionSet, _: &dyn Environment| false);
        let hash = m.info("Nowhere").unwrap().commit();

        let report = m.render(&mut HtmlRenderer::new());
        assert_eq!(report.filtered, vec![hash]);
        m.close().unwrap();
    }

    #[test]
    fn test_without_wrapping_is_a_default_not_an_override() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY).without_wrapping();
        let notice = m.info("x").unwrap().into_notice();
        assert!(!notice.is_wrapped());

        let own = m
            .info("y")
            .unwrap()
            .attribute(Attributes::NO_WRAP, false)
            .into_notice();
        assert!(own.is_wrapped());
        m.close().unwrap();
    }

    #[derive(Serialize, Deserialize)]
    struct Expiring {
        days: u32,
    }

    impl Noticeable for Expiring {
        fn message(&self) -> String {
            format!("Your licence expires in {} days", self.days)
        }
    }

    impl NoticeKind for Expiring {
        const TYPE_NAME: &'static str = "expiring";
    }

    #[test]
    fn test_renderable_resolves_at_render_time() {
        let env = TestEnv::new();
        let resolver = Rc::new(MessageResolver::new().with_renderable::<Expiring>());
        let mut m = env.manager(KEY).with_resolver(resolver);

        let message = Message::renderable(&Expiring { days: 3 }).unwrap();
        m.warning(message).unwrap().commit();

        let mut html = HtmlRenderer::new();
        let report = m.render(&mut html);
        assert!(report.is_clean());
        assert!(html.output().contains("expires in 3 days"));
        m.close().unwrap();
    }

    #[test]
    fn test_vanished_renderable_is_reported_each_pass() {
        let env = TestEnv::new();
        let resolver = Rc::new(MessageResolver::new().with_renderable::<Expiring>());

        let mut m = env.manager(KEY).with_resolver(resolver);
        let message = Message::renderable(&Expiring { days: 3 }).unwrap();
        let hash = m.warning(message).unwrap().commit();
        m.close().unwrap();

        // Next process no longer knows the type.
        let mut m = env.manager(KEY);
        let mut html = HtmlRenderer::new();
        for _ in 0..2 {
            let report = m.render(&mut html);
            assert_eq!(report.failures.len(), 1);
            assert!(report.failures[0].1.is_corruption());
            assert!(m.store().has(&hash));
        }
        m.close().unwrap();
    }

    #[test]
    fn test_deferred_callback_renders_through_manager() {
        let env = TestEnv::new();
        let resolver = Rc::new(MessageResolver::new().with_callback(
            "licence_banner",
            |n: &Notice| format!("Licence check ({})", n.notice_type()),
        ));
        let mut m = env.manager(KEY).with_resolver(resolver);
        let hash = m.warning(Message::deferred("licence_banner")).unwrap().commit();

        let mut html = HtmlRenderer::new();
        let report = m.render(&mut html);
        assert!(report.is_clean());
        assert_eq!(report.rendered, vec![hash]);
        assert!(html.output().contains("Licence check (warning)"));
        m.close().unwrap();
    }

    fn configured(env: &TestEnv, config: &NoticeConfig) -> Manager<Rc<MemBackend>> {
        let store = NoticeStore::open(env.backend.clone(), KEY).unwrap();
        Manager::from_config(store, config)
            .with_clock(env.clock.clone())
            .with_environment(env.environment.clone())
    }

    #[test]
    fn test_from_config_defaults_keep_nags_and_wrapping() {
        let env = TestEnv::new();
        let mut m = configured(&env, &NoticeConfig::default());
        let hash = m.warning("Update available").unwrap().nag(true).commit();

        let mut html = HtmlRenderer::new();
        let report = m.render(&mut html);
        assert!(report.deleted.is_empty());
        assert!(m.store().has(&hash));
        assert!(html.output().contains("<p>Update available</p>"));
        m.close().unwrap();
    }

    #[test]
    fn test_from_config_applies_nag_and_wrapping_switches() {
        let env = TestEnv::new();
        let config = NoticeConfig {
            disable_nag_notices: true,
            without_wrapping: true,
            ..Default::default()
        };
        let mut m = configured(&env, &config);
        let hash = m.warning("Update available").unwrap().nag(true).commit();
        assert!(!m.store().get(&hash).unwrap().is_wrapped());

        let mut html = HtmlRenderer::new();
        let report = m.render(&mut html);
        assert_eq!(report.deleted, vec![hash]);
        assert!(html.output().contains("Update available"));
        assert!(!html.output().contains("<p>"));
        m.close().unwrap();
    }

    #[test]
    fn test_flush_then_close_leaves_no_slot() {
        let env = TestEnv::new();
        let mut m = env.manager(KEY);
        m.info("x").unwrap().commit();
        m.flush().unwrap();
        m.close().unwrap();
        assert!(!env.backend.contains(KEY));
    }
}
