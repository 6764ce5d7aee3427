//! Process-wide name-to-logger registry

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::sinks::ConsoleSink;

use super::error::Result;
use super::logger::Logger;

struct RegistryInner {
    loggers: HashMap<String, Arc<Logger>>,
    default_logger: Option<Arc<Logger>>,
}

/// Shared map of named loggers, with an optional default.
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                loggers: HashMap::new(),
                default_logger: None,
            }),
        }
    }

    /// The process-wide registry instance.
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    /// Get the logger registered under `name`, creating it on first use.
    pub fn get(&self, name: &str) -> Arc<Logger> {
        let mut inner = self.inner.lock();
        if let Some(logger) = inner.loggers.get(name) {
            return Arc::clone(logger);
        }

        let logger = Arc::new(Logger::new(name));
        inner.loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    pub fn set_default(&self, logger: Arc<Logger>) {
        self.inner.lock().default_logger = Some(logger);
    }

    /// Get the default logger, lazily creating a console-backed one.
    pub fn get_default(&self) -> Arc<Logger> {
        let mut inner = self.inner.lock();
        if let Some(logger) = &inner.default_logger {
            return Arc::clone(logger);
        }

        let logger = Arc::new(Logger::new("default"));
        logger.add_sink(Arc::new(ConsoleSink::new()));
        inner
            .loggers
            .insert("default".to_string(), Arc::clone(&logger));
        inner.default_logger = Some(Arc::clone(&logger));
        logger
    }

    /// Flush every registered logger.
    pub fn flush_all(&self) -> Result<()> {
        let loggers: Vec<Arc<Logger>> = self.inner.lock().loggers.values().cloned().collect();
        for logger in loggers {
            logger.flush()?;
        }
        Ok(())
    }

    /// Remove the logger registered under `name`. Existing handles stay
    /// valid; only the registration is dropped.
    pub fn drop(&self, name: &str) {
        self.inner.lock().loggers.remove(name);
    }

    /// Remove every registration, including the default logger.
    pub fn drop_all(&self) {
        let mut inner = self.inner.lock();
        inner.loggers.clear();
        inner.default_logger = None;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Get or create the logger registered under `name` in the global registry.
pub fn get_logger(name: &str) -> Arc<Logger> {
    Registry::global().get(name)
}

/// Get the global default logger.
pub fn get_default_logger() -> Arc<Logger> {
    Registry::global().get_default()
}

/// Replace the global default logger.
pub fn set_default_logger(logger: Arc<Logger>) {
    Registry::global().set_default(logger);
}
