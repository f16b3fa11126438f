//! `use_local_storage_key`: a component's view of one storage key.
//!
//! DESIGN
//! ======
//! The reactive source is the *raw* slot string, never the parsed value.
//! A raw `Option<String>` compares by value, so re-reading an unchanged slot
//! never looks like a change, and the typed value is a [`Memo`] over it that
//! only re-parses when the raw string differs.
//!
//! The hook starts from the server snapshot (`None`) so hydration matches
//! the server render, then reads the live slot in an effect after mount.
//! The subscription is registered before that first read so no change can
//! slip between the two, and it is disposed when the owning scope is
//! cleaned up.
//!
//! [`use_key_binding`] holds the reactive wiring for any backend;
//! [`use_local_storage_key`] feeds it the shared browser gateway.

use keysync::{KeyBinding, StorageBackend, binding, slot};
use leptos::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(test)]
#[path = "local_storage_key_test.rs"]
mod local_storage_key_test;

type WriteFn<T> = Box<dyn Fn(Option<T>)>;

/// Setter half of [`use_local_storage_key`]. `Copy`, so it moves into any
/// number of event handlers.
pub struct StorageSetter<T: 'static> {
    key: StoredValue<String>,
    write: StoredValue<Option<WriteFn<T>>, LocalStorage>,
}

impl<T: 'static> Clone for StorageSetter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for StorageSetter<T> {}

impl<T: 'static> StorageSetter<T> {
    fn unbound(key: &str) -> Self {
        Self { key: StoredValue::new(key.to_string()), write: StoredValue::new_local(None) }
    }

    /// Store `value`, or remove the key for `None`.
    ///
    /// Failures are logged and leave the stored value unchanged.
    pub fn set(&self, value: Option<T>) {
        let written = self.write.try_with_value(|write| match write {
            Some(write) => {
                write(value);
                true
            }
            None => false,
        });
        if written != Some(true) {
            let key = self.key.try_get_value().unwrap_or_default();
            log::warn!("storage write dropped, no storage bound: key={key}");
        }
    }

    /// Remove the key.
    pub fn clear(&self) {
        self.set(None);
    }
}

/// Bind a component to the storage key `key`, parsed as JSON `T`.
///
/// Returns the current logical value (`None` when absent or unparseable)
/// and a setter. Changes from any component or any other tab of the origin
/// update the value. Without browser storage the value stays `None` and the
/// setter only logs.
pub fn use_local_storage_key<T>(key: &str) -> (Memo<Option<T>>, StorageSetter<T>)
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    #[cfg(feature = "hydrate")]
    if let Some(gateway) = crate::storage::shared_gateway() {
        return use_key_binding(KeyBinding::new(gateway, key));
    }

    let raw = RwSignal::new(binding::server_snapshot());
    (derived_value(key, raw), StorageSetter::unbound(key))
}

/// Reactive view of an existing binding, over any backend.
///
/// Must run inside a reactive owner; the subscription lives until that
/// owner is cleaned up.
pub fn use_key_binding<T, B>(bound: KeyBinding<T, B>) -> (Memo<Option<T>>, StorageSetter<T>)
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
    B: StorageBackend + 'static,
{
    let raw = RwSignal::new(KeyBinding::<T, B>::get_server_snapshot());
    let value = derived_value(bound.key(), raw);

    let reader = bound.clone();
    let subscription = bound.subscribe(move || refresh(raw, &reader));
    let subscription = StoredValue::new_local(Some(subscription));
    on_cleanup(move || {
        subscription.try_update_value(|sub| {
            if let Some(sub) = sub.take() {
                sub.dispose();
            }
        });
    });

    let reader = bound.clone();
    Effect::new(move || refresh(raw, &reader));

    let key = bound.key().to_string();
    let write: WriteFn<T> = Box::new(move |value| bound.set_value(value.as_ref()));
    let setter = StorageSetter { key: StoredValue::new(key), write: StoredValue::new_local(Some(write)) };

    (value, setter)
}

fn derived_value<T>(key: &str, raw: RwSignal<Option<String>>) -> Memo<Option<T>>
where
    T: DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    let key = key.to_string();
    Memo::new(move |_| raw.with(|raw| slot::derive::<T>(&key, raw.as_deref())))
}

/// Copy the current snapshot into `raw` if it changed.
fn refresh<T, B>(raw: RwSignal<Option<String>>, bound: &KeyBinding<T, B>)
where
    T: Serialize + DeserializeOwned,
    B: StorageBackend,
{
    let next = bound.get_snapshot();
    if raw.try_get_untracked().is_some_and(|current| current != next) {
        raw.set(next);
    }
}
