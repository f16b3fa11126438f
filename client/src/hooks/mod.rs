//! Leptos hooks that bind component state to browser storage.

pub mod local_storage_key;

pub use local_storage_key::{StorageSetter, use_key_binding, use_local_storage_key};
