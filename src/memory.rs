//! In-memory stand-in for one origin's persistent store.
//!
//! DESIGN
//! ======
//! A [`MemoryOrigin`] owns the slots. Each [`MemoryOrigin::open_context`]
//! call simulates one tab: it gets its own listener registry and a gateway
//! over a [`MemoryBackend`] bound to that context. Mirroring browser
//! behavior, a mutation that actually changes a slot is delivered natively
//! to every *other* open context and never to the writer's own; the gateway
//! covers the writer's context itself.
//!
//! Fault injection: [`MemoryOrigin::set_available`] simulates disabled
//! storage and the configured byte quota simulates `QuotaExceededError`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::broadcast::{Broadcaster, StorageEvent};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::gateway::{StorageBackend, StorageGateway};

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

/// Identifies one simulated tab of an origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

struct OriginState {
    slots: HashMap<String, String>,
    available: bool,
    quota_bytes: Option<usize>,
    next_context: u64,
    contexts: Vec<(ContextId, Broadcaster)>,
}

impl OriginState {
    fn used_bytes_without(&self, key: &str) -> usize {
        self.slots
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn peers_of(&self, context: ContextId) -> Vec<Broadcaster> {
        self.contexts
            .iter()
            .filter(|(id, _)| *id != context)
            .map(|(_, events)| events.clone())
            .collect()
    }
}

/// Shared store for every context of one simulated origin.
#[derive(Clone)]
pub struct MemoryOrigin {
    state: Rc<RefCell<OriginState>>,
    config: StoreConfig,
}

impl Default for MemoryOrigin {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl MemoryOrigin {
    pub fn new(config: StoreConfig) -> Self {
        let state = OriginState {
            slots: HashMap::new(),
            available: true,
            quota_bytes: config.quota_bytes,
            next_context: 0,
            contexts: Vec::new(),
        };
        Self { state: Rc::new(RefCell::new(state)), config }
    }

    /// Open a new context (tab) and return its gateway.
    pub fn open_context(&self) -> StorageGateway<MemoryBackend> {
        let events = Broadcaster::new();
        let context = {
            let mut state = self.state.borrow_mut();
            let id = ContextId(state.next_context);
            state.next_context += 1;
            state.contexts.push((id, events.clone()));
            id
        };
        let backend = MemoryBackend { origin: Rc::clone(&self.state), context };
        StorageGateway::with_broadcaster(backend, events).configured(&self.config)
    }

    /// Stop native delivery to `context`, as when a tab closes.
    pub fn close_context(&self, context: ContextId) {
        self.state.borrow_mut().contexts.retain(|(id, _)| *id != context);
    }

    /// Enable or disable the store. A disabled store rejects every operation.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    /// Place a raw value directly in the store without notifying anyone.
    pub fn inject(&self, key: &str, raw: &str) {
        self.state.borrow_mut().slots.insert(key.to_string(), raw.to_string());
    }

    /// Raw value currently stored under `key`.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.state.borrow().slots.get(key).cloned()
    }

    /// Clear every slot, as another context calling `clear()` would.
    ///
    /// Every open context receives one cleared-area event.
    pub fn clear(&self) {
        let peers: Vec<Broadcaster> = {
            let mut state = self.state.borrow_mut();
            state.slots.clear();
            state.contexts.iter().map(|(_, events)| events.clone()).collect()
        };
        deliver_to_peers(peers, &StorageEvent::cleared());
    }

    pub fn len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes counted against the quota: key plus value length for every slot.
    pub fn used_bytes(&self) -> usize {
        self.state.borrow().slots.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// Backend for one context of a [`MemoryOrigin`].
pub struct MemoryBackend {
    origin: Rc<RefCell<OriginState>>,
    context: ContextId,
}

impl MemoryBackend {
    pub fn context(&self) -> ContextId {
        self.context
    }
}

fn deliver_to_peers(peers: Vec<Broadcaster>, event: &StorageEvent) {
    for events in peers {
        events.dispatch(event);
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = self.origin.borrow();
        if !state.available {
            return Err(StoreError::Unavailable);
        }
        Ok(state.slots.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let peers = {
            let mut state = self.origin.borrow_mut();
            if !state.available {
                return Err(StoreError::Unavailable);
            }
            if let Some(quota) = state.quota_bytes {
                if state.used_bytes_without(key) + key.len() + value.len() > quota {
                    return Err(StoreError::QuotaExceeded { key: key.to_string() });
                }
            }
            let previous = state.slots.insert(key.to_string(), value.to_string());
            if previous.as_deref() == Some(value) {
                return Ok(());
            }
            state.peers_of(self.context)
        };
        deliver_to_peers(peers, &StorageEvent::set(key, value));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let peers = {
            let mut state = self.origin.borrow_mut();
            if !state.available {
                return Err(StoreError::Unavailable);
            }
            if state.slots.remove(key).is_none() {
                return Ok(());
            }
            state.peers_of(self.context)
        };
        deliver_to_peers(peers, &StorageEvent::removed(key));
        Ok(())
    }
}

impl Drop for MemoryBackend {
    fn drop(&mut self) {
        if let Ok(mut state) = self.origin.try_borrow_mut() {
            state.contexts.retain(|(id, _)| *id != self.context);
        }
    }
}
