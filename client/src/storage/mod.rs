//! Process-wide browser storage gateway.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every hook in the page shares one [`StorageGateway`] per thread so that
//! a write from one component reaches every other component bound to the
//! same key. The gateway is created on first use from the installed
//! [`StoreConfig`] and wired to the window `storage` event for changes made
//! in other tabs.
//!
//! TRADE-OFFS
//! ==========
//! Configuration is fixed once the gateway exists; a late [`install`] is
//! logged and ignored rather than re-pointing live subscriptions.

#[cfg(feature = "hydrate")]
pub mod web;
#[cfg(feature = "hydrate")]
mod window_events;

use std::cell::RefCell;

use keysync::StoreConfig;
#[cfg(feature = "hydrate")]
use keysync::StorageGateway;

#[cfg(feature = "hydrate")]
pub use web::WebStorage;


thread_local! {
    static CONFIG: RefCell<StoreConfig> = RefCell::new(StoreConfig::default());
}

#[cfg(feature = "hydrate")]
thread_local! {
    static GATEWAY: RefCell<Option<StorageGateway<WebStorage>>> = const { RefCell::new(None) };
}

/// Set the config used when the shared gateway is first created.
///
/// Returns `false` (and logs) if the gateway already exists.
pub fn install(config: StoreConfig) -> bool {
    if gateway_created() {
        log::warn!("storage gateway already created; ignoring config {config:?}");
        return false;
    }
    CONFIG.with(|slot| *slot.borrow_mut() = config);
    true
}

/// Config currently in effect for the shared gateway.
pub fn config() -> StoreConfig {
    CONFIG.with(|slot| slot.borrow().clone())
}

#[cfg(feature = "hydrate")]
fn gateway_created() -> bool {
    GATEWAY.with(|slot| slot.borrow().is_some())
}

#[cfg(not(feature = "hydrate"))]
fn gateway_created() -> bool {
    false
}

/// Shared gateway over the configured browser storage area.
///
/// Returns `None` when storage is disabled or missing; the fault is logged.
#[cfg(feature = "hydrate")]
pub fn shared_gateway() -> Option<StorageGateway<WebStorage>> {
    if let Some(gateway) = GATEWAY.with(|slot| slot.borrow().clone()) {
        return Some(gateway);
    }

    let config = config();
    let backend = match WebStorage::open(config.area) {
        Ok(backend) => backend,
        Err(e) => {
            log::warn!("browser storage unavailable: area={:?} error={e}", config.area);
            return None;
        }
    };
    let gateway = StorageGateway::new(backend).configured(&config);
    if let Err(e) = window_events::forward_to(&gateway) {
        log::warn!("cross-tab storage sync disabled: {e}");
    }

    GATEWAY.with(|slot| *slot.borrow_mut() = Some(gateway.clone()));
    Some(gateway)
}
