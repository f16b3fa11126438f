//! # client
//!
//! Browser side of keysync: a `localStorage`/`sessionStorage` backend over
//! `web-sys`, the window `storage` event bridge that carries changes from
//! other tabs, and the Leptos hook that binds a component to one key.
//!
//! Browser-only code is gated behind `#[cfg(feature = "hydrate")]`. Without
//! it (server rendering, native tests) the hook reports the server snapshot
//! and writes are dropped.

pub mod hooks;
pub mod logging;
pub mod storage;
