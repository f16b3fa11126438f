//! Storage mutation events and the listener registry that delivers them.
//!
//! DELIVERY RULES
//! ==============
//! - A dispatch only reaches listeners registered before it started.
//! - A listener removed while a dispatch is in flight is skipped for the
//!   rest of that dispatch.
//! - No registry borrow is held while a listener runs, so listeners may
//!   write to the store (nested dispatch) or register/remove listeners.

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod broadcast_test;

/// A change notification for one slot of the store.
///
/// Same shape for mutations made in this context and for mutations the
/// platform reports from other contexts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed. `None` when the whole storage area was cleared.
    pub key: Option<String>,
    /// Value after the change. `None` signals deletion.
    pub new_value: Option<String>,
}

impl StorageEvent {
    pub fn set(key: &str, value: &str) -> Self {
        Self { key: Some(key.to_string()), new_value: Some(value.to_string()) }
    }

    pub fn removed(key: &str) -> Self {
        Self { key: Some(key.to_string()), new_value: None }
    }

    pub fn cleared() -> Self {
        Self { key: None, new_value: None }
    }

    /// Whether this event may have changed the slot under `key`.
    ///
    /// A cleared-area event affects every key.
    pub fn affects(&self, key: &str) -> bool {
        self.key.as_deref().map_or(true, |k| k == key)
    }
}

/// Handle returned by [`Broadcaster::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&StorageEvent)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Shared, cloneable listener registry. Clones deliver to the same set.
#[derive(Clone, Default)]
pub struct Broadcaster {
    inner: Rc<RefCell<Registry>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StorageEvent) + 'static,
    {
        let mut reg = self.inner.borrow_mut();
        let id = ListenerId(reg.next_id);
        reg.next_id += 1;
        reg.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Deregister a listener. Returns `false` if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut reg = self.inner.borrow_mut();
        let before = reg.listeners.len();
        reg.listeners.retain(|(lid, _)| *lid != id);
        reg.listeners.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.inner.borrow().listeners.iter().any(|(lid, _)| *lid == id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener registered at the time of the call.
    pub fn dispatch(&self, event: &StorageEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(id, l)| (*id, Rc::clone(l)))
            .collect();

        for (id, listener) in snapshot {
            if self.contains(id) {
                listener(event);
            }
        }
    }

    /// Whether two handles share one registry.
    pub fn same_as(&self, other: &Broadcaster) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
