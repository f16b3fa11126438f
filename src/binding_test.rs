use super::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::memory::{MemoryBackend, MemoryOrigin};

fn bind<T: Serialize + DeserializeOwned>(origin: &MemoryOrigin, key: &str) -> KeyBinding<T, MemoryBackend> {
    KeyBinding::new(origin.open_context(), key)
}

fn counter<T: Serialize + DeserializeOwned>(binding: &KeyBinding<T, MemoryBackend>) -> (Subscription, Rc<Cell<u32>>) {
    let hits = Rc::new(Cell::new(0));
    let sink = Rc::clone(&hits);
    let sub = binding.subscribe(move || sink.set(sink.get() + 1));
    (sub, hits)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    visits: u32,
}

// =============================================================
// Snapshot and derivation
// =============================================================

#[test]
fn snapshot_is_raw_stored_text() {
    let origin = MemoryOrigin::default();
    let name = bind::<String>(&origin, "demo:name");

    assert_eq!(name.get_snapshot(), None);
    name.set_value(Some(&"ada".to_string()));
    assert_eq!(name.get_snapshot().as_deref(), Some("\"ada\""));
    assert_eq!(name.get_snapshot(), name.get_snapshot());
}

#[test]
fn server_snapshot_is_always_none() {
    let origin = MemoryOrigin::default();
    origin.inject("demo:count", "3");
    assert_eq!(KeyBinding::<i64, MemoryBackend>::get_server_snapshot(), None);
}

#[test]
fn derived_value_is_stable_while_raw_unchanged() {
    let origin = MemoryOrigin::default();
    let profile = bind::<Profile>(&origin, "profile");
    profile.set_value(Some(&Profile { name: "ada".into(), visits: 1 }));

    let first = profile.value().unwrap();
    let second = profile.value().unwrap();
    assert!(Rc::ptr_eq(&first, &second));

    profile.set_value(Some(&Profile { name: "ada".into(), visits: 2 }));
    let third = profile.value().unwrap();
    assert!(!Rc::ptr_eq(&first, &third));
    assert_eq!(third.visits, 2);
}

#[test]
fn derivation_round_trips_serializable_values() {
    let origin = MemoryOrigin::default();
    let profile = bind::<Profile>(&origin, "profile");
    let value = Profile { name: "grace".into(), visits: 7 };

    let raw = slot::serialize("profile", &value).unwrap();
    assert_eq!(profile.derive_value(Some(raw.as_str())).as_deref(), Some(&value));
    assert_eq!(profile.derive_value(None), None);
}

#[test]
fn clones_share_the_derivation_cache() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    let twin = count.clone();
    count.set_value(Some(&5));

    let a = count.value().unwrap();
    let b = twin.value().unwrap();

    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(twin.key(), "demo:count");
}

// =============================================================
// Subscriptions
// =============================================================

#[test]
fn same_context_write_notifies_before_next_read() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    let observed = Rc::new(RefCell::new(Vec::new()));
    let reader = count.clone();
    let sink = Rc::clone(&observed);
    let _sub = count.subscribe(move || sink.borrow_mut().push(reader.get_snapshot()));

    count.set_value(Some(&1));

    assert_eq!(*observed.borrow(), vec![Some("1".to_string())]);
}

#[test]
fn subscriptions_ignore_other_keys() {
    let origin = MemoryOrigin::default();
    let tab = origin.open_context();
    let a = KeyBinding::<i64, MemoryBackend>::new(tab.clone(), "a");
    let b = KeyBinding::<i64, MemoryBackend>::new(tab, "b");
    let (_sub, hits_b) = counter(&b);

    a.set_value(Some(&1));
    a.set_value(None);

    assert_eq!(hits_b.get(), 0);
}

#[test]
fn cleared_area_notifies_every_key() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    count.set_value(Some(&4));
    let (_sub, hits) = counter(&count);

    origin.clear();

    assert_eq!(hits.get(), 1);
    assert_eq!(count.value(), None);
}

#[test]
fn dispose_stops_delivery_and_is_idempotent() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    let (sub, hits) = counter(&count);

    count.set_value(Some(&1));
    sub.dispose();
    sub.dispose();
    count.set_value(Some(&2));

    assert_eq!(hits.get(), 1);
    assert!(!sub.is_active());
}

#[test]
fn dispose_inside_callback_blocks_same_turn_delivery() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    let (victim, hits) = counter(&count);
    let victim = Rc::new(victim);

    let writer = count.clone();
    let to_dispose = Rc::clone(&victim);
    let _first = count.subscribe(move || {
        to_dispose.dispose();
        // Broadcast again in the same synchronous turn.
        if writer.get_snapshot().as_deref() == Some("1") {
            writer.set_value(Some(&2));
        }
    });

    count.set_value(Some(&1));

    // The victim registered before `_first`, so it saw the first event.
    assert_eq!(hits.get(), 1);
    assert_eq!(count.get_snapshot().as_deref(), Some("2"));
}

#[test]
fn dropping_subscription_unsubscribes() {
    let origin = MemoryOrigin::default();
    let tab = origin.open_context();
    let count = KeyBinding::<i64, MemoryBackend>::new(tab.clone(), "demo:count");
    let (sub, hits) = counter(&count);
    assert_eq!(tab.events().len(), 1);

    drop(sub);
    count.set_value(Some(&1));

    assert!(tab.events().is_empty());
    assert_eq!(hits.get(), 0);
}

#[test]
fn each_subscription_gets_one_notification_per_mutation() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    let (_a, hits_a) = counter(&count);
    let (_b, hits_b) = counter(&count);

    count.set_value(Some(&1));

    assert_eq!((hits_a.get(), hits_b.get()), (1, 1));
}

// =============================================================
// Setter
// =============================================================

#[test]
fn count_scenario_sets_increments_and_clears() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");

    count.set_value(Some(&0));
    assert_eq!(count.get_snapshot().as_deref(), Some("0"));
    assert_eq!(count.value().as_deref(), Some(&0));

    count.update(|prev| Some(prev.copied().unwrap_or(0) + 1));
    assert_eq!(count.get_snapshot().as_deref(), Some("1"));
    assert_eq!(count.value().as_deref(), Some(&1));

    count.set_value(None);
    assert_eq!(count.get_snapshot(), None);
    assert_eq!(count.value(), None);
}

#[test]
fn clearing_absent_key_broadcasts_once_and_stays_absent() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    let (_sub, hits) = counter(&count);

    count.set_value(None);

    assert_eq!(hits.get(), 1);
    assert_eq!(count.get_snapshot(), None);
}

#[test]
fn enabled_scenario_reaches_independent_subscriber() {
    let origin = MemoryOrigin::default();
    let tab = origin.open_context();
    let writer = KeyBinding::<bool, MemoryBackend>::new(tab.clone(), "demo:enabled");
    let observer = KeyBinding::<bool, MemoryBackend>::new(tab, "demo:enabled");
    let seen = Rc::new(RefCell::new(None));
    let reader = observer.clone();
    let sink = Rc::clone(&seen);
    let _sub = observer.subscribe(move || *sink.borrow_mut() = reader.value().map(|v| *v));

    writer.set_value(Some(&true));

    assert_eq!(writer.get_snapshot().as_deref(), Some("true"));
    assert_eq!(*seen.borrow(), Some(true));
}

#[test]
fn unserializable_value_leaves_store_untouched() {
    let origin = MemoryOrigin::default();
    let grid = bind::<HashMap<(i32, i32), u8>>(&origin, "grid");
    origin.inject("grid", "{}");
    let (_sub, hits) = counter(&grid);
    let mut value = HashMap::new();
    value.insert((1, 2), 3);

    grid.set_value(Some(&value));
    let err = grid.try_set_value(Some(&value)).unwrap_err();

    assert!(matches!(err, StoreError::Serialize { .. }));
    assert_eq!(grid.get_snapshot().as_deref(), Some("{}"));
    assert_eq!(hits.get(), 0);
}

#[test]
fn store_fault_leaves_prior_value() {
    let origin = MemoryOrigin::new(StoreConfig { quota_bytes: Some(16), ..StoreConfig::default() });
    let name = bind::<String>(&origin, "demo:name");
    name.set_value(Some(&"ada".to_string()));
    let (_sub, hits) = counter(&name);

    let long = "x".repeat(64);
    name.set_value(Some(&long));
    let err = name.try_set_value(Some(&long)).unwrap_err();

    assert!(matches!(err, StoreError::QuotaExceeded { .. }));
    assert_eq!(name.value().as_deref().map(String::as_str), Some("ada"));
    assert_eq!(hits.get(), 0);
}

// =============================================================
// Corrupt values
// =============================================================

#[test]
fn malformed_raw_value_reads_as_none_without_panicking() {
    let origin = MemoryOrigin::default();
    origin.inject("demo:name", "{not json");
    let name = bind::<String>(&origin, "demo:name");

    assert_eq!(name.get_snapshot().as_deref(), Some("{not json"));
    assert_eq!(name.value(), None);
    assert_eq!(name.read_slot(), Slot::Corrupt);
}

#[test]
fn read_slot_tells_absent_from_present() {
    let origin = MemoryOrigin::default();
    let count = bind::<i64>(&origin, "demo:count");
    assert_eq!(count.read_slot(), Slot::Absent);

    count.set_value(Some(&9));
    assert_eq!(count.read_slot(), Slot::Present(9));
}

// =============================================================
// Across contexts
// =============================================================

#[test]
fn write_in_one_tab_notifies_the_other_once() {
    let origin = MemoryOrigin::default();
    let tab_a = bind::<i64>(&origin, "demo:count");
    let tab_b = bind::<i64>(&origin, "demo:count");
    let (_sub, hits_b) = counter(&tab_b);

    tab_a.set_value(Some(&3));

    assert_eq!(hits_b.get(), 1);
    assert_eq!(tab_b.value().as_deref(), Some(&3));
}

#[test]
fn last_writer_wins_across_tabs() {
    let origin = MemoryOrigin::default();
    let tab_a = bind::<String>(&origin, "demo:name");
    let tab_b = bind::<String>(&origin, "demo:name");

    tab_a.set_value(Some(&"from a".to_string()));
    tab_b.set_value(Some(&"from b".to_string()));

    assert_eq!(tab_a.value().as_deref().map(String::as_str), Some("from b"));
    assert_eq!(tab_b.value().as_deref().map(String::as_str), Some("from b"));
}
