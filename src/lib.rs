//! Per-key subscription store over browser-style persistent key-value storage.
//!
//! Keeps any number of observers of one storage key in sync with changes made
//! in the same context or reported from other contexts (tabs) of the origin.
//! The browser adapter and the Leptos hook live in the `client` crate; this
//! crate is platform-neutral and fully testable natively.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`gateway`] | [`gateway::StorageBackend`] trait and the broadcasting [`gateway::StorageGateway`] |
//! | [`broadcast`] | [`broadcast::StorageEvent`] and the listener registry |
//! | [`binding`] | [`binding::KeyBinding`]: subscribe, snapshot, derive, set |
//! | [`slot`] | JSON boundary and the tagged [`slot::Slot`] read |
//! | [`memory`] | In-memory multi-context origin for tests and native hosts |
//! | [`config`] | Environment-driven [`config::StoreConfig`] |
//! | [`error`] | [`error::StoreError`] and [`error::ConfigError`] |

pub mod binding;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod slot;

pub use binding::{KeyBinding, Subscription};
pub use broadcast::{Broadcaster, ListenerId, StorageEvent};
pub use config::{StorageArea, StoreConfig};
pub use error::{ConfigError, StoreError, StoreOp};
pub use gateway::{StorageBackend, StorageGateway};
pub use memory::{MemoryBackend, MemoryOrigin};
pub use slot::Slot;
