//! Storage gateway: synchronous CRUD over one flat string namespace, plus
//! broadcast of every mutation it performs.
//!
//! SYSTEM CONTEXT
//! ==============
//! Browser storage only notifies *other* contexts of a mutation, never the
//! one that made it. The gateway pairs every local write/remove with an
//! explicit dispatch on its own [`Broadcaster`], and platform events from
//! other contexts enter through [`StorageGateway::dispatch_remote`] on the
//! same registry. Subscribers cannot tell local from remote changes.

use std::rc::Rc;

use crate::broadcast::{Broadcaster, ListenerId, StorageEvent};
use crate::config::StoreConfig;
use crate::error::StoreError;

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

/// Platform key-value store. Implementations are synchronous and atomic per key.
pub trait StorageBackend {
    /// Current value under `key`, `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the platform store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally overwrite `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write was rejected; the slot is unchanged.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the platform store cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Cloneable gateway handle. Clones share the backend and the listener set.
pub struct StorageGateway<B> {
    backend: Rc<B>,
    events: Broadcaster,
    trace_events: bool,
}

impl<B> Clone for StorageGateway<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            events: self.events.clone(),
            trace_events: self.trace_events,
        }
    }
}

impl<B: StorageBackend> StorageGateway<B> {
    pub fn new(backend: B) -> Self {
        Self::with_broadcaster(backend, Broadcaster::new())
    }

    /// Build a gateway that delivers on an existing registry.
    pub fn with_broadcaster(backend: B, events: Broadcaster) -> Self {
        Self { backend: Rc::new(backend), events, trace_events: false }
    }

    /// Apply the logging switches from `config`.
    #[must_use]
    pub fn configured(mut self, config: &StoreConfig) -> Self {
        self.trace_events = config.trace_events;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn events(&self) -> &Broadcaster {
        &self.events
    }

    /// Raw slot value for `key`. Backend faults are logged and read as absent.
    pub fn read(&self, key: &str) -> Option<String> {
        match self.backend.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                log::error!("storage read failed: key={key} error={e}");
                None
            }
        }
    }

    /// Persist `value` under `key`, then notify local listeners.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`]; nothing is broadcast on failure.
    pub fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.backend.set_item(key, value)?;
        self.broadcast(&StorageEvent::set(key, value));
        Ok(())
    }

    /// Delete `key`, then notify local listeners.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`]; nothing is broadcast on failure.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove_item(key)?;
        self.broadcast(&StorageEvent::removed(key));
        Ok(())
    }

    /// Deliver an event the platform reported from another context.
    pub fn dispatch_remote(&self, event: &StorageEvent) {
        self.broadcast(event);
    }

    pub fn listen<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StorageEvent) + 'static,
    {
        self.events.add(listener)
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.events.remove(id)
    }

    fn broadcast(&self, event: &StorageEvent) {
        if self.trace_events {
            log::debug!(
                "storage event: key={:?} new_value={:?} listeners={}",
                event.key,
                event.new_value,
                self.events.len()
            );
        }
        self.events.dispatch(event);
    }
}
