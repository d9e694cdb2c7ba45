//! Structured events emitted by the file systems and the read timers.
//!
//! Every component holds an [`Observer`] handed to it by the caller. The default
//! [`LogObserver`] forwards to the `log` facade; [`MemoryObserver`] keeps events in memory
//! so tests can assert on them.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::Level;

/// A single log-like event: level, message and a flat list of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub level: Level,
    pub message: String,
    pub attributes: Vec<(&'static str, String)>,
}

impl Event {
    pub fn new<S: Into<String>>(level: Level, message: S) -> Self {
        Self {
            level,
            message: message.into(),
            attributes: Vec::new(),
        }
    }

    pub fn info<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn debug<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Debug, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new(Level::Error, message)
    }

    /// Appends an attribute.
    pub fn with<V: fmt::Display>(mut self, key: &'static str, value: V) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    /// Returns the value of the first attribute named `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Receiver of [`Event`]s. Implementations must be cheap; they are called inline.
pub trait Observer: Send + Sync {
    fn notify(&self, event: Event);
}

/// Forwards events to the `log` facade under the `zipfs_kit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, event: Event) {
        log::log!(target: "zipfs_kit", event.level, "{}", event);
    }
}

/// Records every event it receives.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<Event>>,
}

impl MemoryObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // a panicking test thread must not hide the events recorded so far
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Observer for MemoryObserver {
    fn notify(&self, event: Event) {
        self.lock().push(event);
    }
}

/// The observer used when the caller does not supply one.
pub fn default_observer() -> Arc<dyn Observer> {
    Arc::new(LogObserver)
}
