//! Per-key reactive binding over a [`StorageGateway`].
//!
//! A [`KeyBinding`] gives any number of observers of one key:
//! - change notification ([`KeyBinding::subscribe`]),
//! - a torn-free raw snapshot ([`KeyBinding::get_snapshot`]),
//! - a typed, memoized logical value ([`KeyBinding::derive_value`]),
//! - a typed setter ([`KeyBinding::set_value`]).
//!
//! CONSISTENCY
//! ===========
//! The snapshot is a plain read of the store with no cache of its own, so it
//! always reflects the last completed write or remove. Only the derived value
//! is cached, keyed on equality of the raw string, so repeated derivations of
//! an unchanged slot hand back the same `Rc`.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here panics or returns an error to observers. Unreadable values
//! derive to `None`; failed writes are logged and leave the store untouched.
//! [`KeyBinding::try_set_value`] is the variant that reports the fault.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::broadcast::{Broadcaster, ListenerId};
use crate::error::StoreError;
use crate::gateway::{StorageBackend, StorageGateway};
use crate::slot::{self, Slot};

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

/// Live registration of a change callback on one key.
///
/// Dropping the subscription disposes it.
pub struct Subscription {
    events: Broadcaster,
    id: ListenerId,
    active: Cell<bool>,
}

impl Subscription {
    /// Stop delivery immediately. Further calls do nothing.
    pub fn dispose(&self) {
        if self.active.replace(false) {
            self.events.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

/// Snapshot for environments with no store, such as server rendering.
///
/// Always `None`: the value is not known yet.
pub fn server_snapshot() -> Option<String> {
    None
}

struct Derived<T> {
    raw: Option<String>,
    value: Option<Rc<T>>,
}

/// Binding of one storage key to logical type `T`.
///
/// Clones share the gateway and the derived-value cache.
pub struct KeyBinding<T, B> {
    key: Rc<str>,
    gateway: StorageGateway<B>,
    derived: Rc<RefCell<Option<Derived<T>>>>,
    _ty: PhantomData<fn() -> T>,
}

impl<T, B> Clone for KeyBinding<T, B> {
    fn clone(&self) -> Self {
        Self {
            key: Rc::clone(&self.key),
            gateway: self.gateway.clone(),
            derived: Rc::clone(&self.derived),
            _ty: PhantomData,
        }
    }
}

impl<T, B> KeyBinding<T, B>
where
    T: Serialize + DeserializeOwned,
    B: StorageBackend,
{
    pub fn new(gateway: StorageGateway<B>, key: &str) -> Self {
        Self { key: Rc::from(key), gateway, derived: Rc::new(RefCell::new(None)), _ty: PhantomData }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Call `on_change` after every mutation of this key, local or remote.
    ///
    /// Mutations of other keys are ignored. A cleared storage area counts as
    /// a mutation of every key.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let key = Rc::clone(&self.key);
        let id = self.gateway.listen(move |event| {
            if event.affects(&key) {
                on_change();
            }
        });
        Subscription { events: self.gateway.events().clone(), id, active: Cell::new(true) }
    }

    /// Current raw slot value, exactly as stored.
    pub fn get_snapshot(&self) -> Option<String> {
        self.gateway.read(&self.key)
    }

    /// See [`server_snapshot`].
    pub fn get_server_snapshot() -> Option<String> {
        server_snapshot()
    }

    /// Logical value for `raw`, memoized on the raw string.
    pub fn derive_value(&self, raw: Option<&str>) -> Option<Rc<T>> {
        let mut derived = self.derived.borrow_mut();
        if let Some(cached) = derived.as_ref() {
            if cached.raw.as_deref() == raw {
                return cached.value.clone();
            }
        }
        let value = slot::derive::<T>(&self.key, raw).map(Rc::new);
        *derived = Some(Derived { raw: raw.map(str::to_string), value: value.clone() });
        value
    }

    /// Logical value of the current snapshot.
    pub fn value(&self) -> Option<Rc<T>> {
        let raw = self.get_snapshot();
        self.derive_value(raw.as_deref())
    }

    /// Tagged read that tells an absent slot from a corrupt one.
    pub fn read_slot(&self) -> Slot<T> {
        Slot::from_raw(&self.key, self.get_snapshot().as_deref())
    }

    /// Store `value`, or remove the key for `None`. Faults are logged.
    pub fn set_value(&self, value: Option<&T>) {
        if let Err(e) = self.try_set_value(value) {
            log::error!("storage write dropped: key={} error={e}", self.key);
        }
    }

    /// Store `value`, or remove the key for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] when `value` has no stored form, or
    /// the gateway's error when the store rejects the write. In both cases
    /// the prior stored value is left untouched and nothing is broadcast.
    pub fn try_set_value(&self, value: Option<&T>) -> Result<(), StoreError> {
        match value {
            None => self.gateway.remove(&self.key),
            Some(value) => {
                let raw = slot::serialize(&self.key, value)?;
                self.gateway.write(&self.key, &raw)
            }
        }
    }

    /// Replace the value with `f(current)`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(Option<&T>) -> Option<T>,
    {
        let current = self.value();
        let next = f(current.as_deref());
        self.set_value(next.as_ref());
    }
}
