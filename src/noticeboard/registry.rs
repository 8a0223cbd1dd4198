//! Named managers, owned by the application.
//!
//! A [`Registry`] hands out one [`Manager`] per name, creating it on first
//! use. All managers share the registry's backend, resolver, environment and
//! clock. [`Registry::close`] commits every manager it created.

use crate::config::NoticeConfig;
use crate::environment::{Environment, EnvironmentSnapshot};
use crate::error::Result;
use crate::manager::Manager;
use crate::message::MessageResolver;
use crate::store::StorageBackend;
use crate::str_case;
use crate::time::{Clock, SystemClock};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::rc::Rc;

pub struct Registry<B: StorageBackend + Clone> {
    backend: B,
    config: NoticeConfig,
    resolver: Rc<MessageResolver>,
    environment: Rc<dyn Environment>,
    clock: Rc<dyn Clock>,
    managers: IndexMap<String, Manager<B>>,
}

impl<B: StorageBackend + Clone> Registry<B> {
    pub fn new(backend: B, config: NoticeConfig) -> Self {
        Self {
            backend,
            config,
            resolver: Rc::new(MessageResolver::new()),
            environment: Rc::new(EnvironmentSnapshot::new()),
            clock: Rc::new(SystemClock),
            managers: IndexMap::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: MessageResolver) -> Self {
        self.resolver = Rc::new(resolver);
        self
    }

    pub fn with_environment(mut self, environment: Rc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &NoticeConfig {
        &self.config
    }

    /// The manager for `name`, stored under `snake(name)`.
    pub fn make(&mut self, name: &str) -> Result<&mut Manager<B>> {
        self.manager_for(str_case::storage_key(name))
    }

    /// The manager stored under the configured app key.
    pub fn default_manager(&mut self) -> Result<&mut Manager<B>> {
        let key = self.config.storage_key();
        self.manager_for(key)
    }

    pub fn get(&mut self, name: &str) -> Option<&mut Manager<B>> {
        self.managers.get_mut(&str_case::storage_key(name))
    }

    /// Storage keys of the managers created so far.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    fn manager_for(&mut self, key: String) -> Result<&mut Manager<B>> {
        match self.managers.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let manager = Manager::open(self.backend.clone(), entry.key().as_str(), &self.config)?
                    .with_resolver(Rc::clone(&self.resolver))
                    .with_environment(Rc::clone(&self.environment))
                    .with_clock(Rc::clone(&self.clock));
                tracing::debug!(key = %entry.key(), "notice manager created");
                Ok(entry.insert(manager))
            }
        }
    }

    /// Commits every manager. All are closed even if one fails; the first
    /// error is returned.
    pub fn close(self) -> Result<()> {
        let mut first_error = None;
        for (key, manager) in self.managers {
            if let Err(err) = manager.close() {
                tracing::warn!(key = %key, error = %err, "failed to commit notices");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
