//! [`StorageBackend`] over `window.localStorage` / `window.sessionStorage`.

use keysync::{StorageArea, StorageBackend, StoreError, StoreOp};
use wasm_bindgen::{JsCast, JsValue};

/// One browser storage area.
pub struct WebStorage {
    storage: web_sys::Storage,
}

impl WebStorage {
    /// Open the storage area on the current window.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] when there is no window or the area is
    /// missing, [`StoreError::Access`] when the browser refuses access
    /// (for example storage disabled by privacy settings).
    pub fn open(area: StorageArea) -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or(StoreError::Unavailable)?;
        let storage = match area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        };
        match storage {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(StoreError::Unavailable),
            Err(e) => Err(map_js_error(StoreOp::Read, "", &e)),
        }
    }

    /// The underlying `Storage` object, used to match incoming events.
    pub fn raw(&self) -> &web_sys::Storage {
        &self.storage
    }
}

impl StorageBackend for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(|e| map_js_error(StoreOp::Read, key, &e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| map_js_error(StoreOp::Write, key, &e))
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(|e| map_js_error(StoreOp::Remove, key, &e))
    }
}

fn map_js_error(op: StoreOp, key: &str, err: &JsValue) -> StoreError {
    if let Some(dom) = err.dyn_ref::<web_sys::DomException>() {
        if dom.name() == "QuotaExceededError" {
            return StoreError::QuotaExceeded { key: key.to_string() };
        }
        return StoreError::Access { op, key: key.to_string(), message: format!("{}: {}", dom.name(), dom.message()) };
    }
    let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    StoreError::Access { op, key: key.to_string(), message }
}
