//! Bridge from the window `storage` event to the shared gateway.
//!
//! The browser fires `storage` only in tabs *other* than the writer, so
//! there is no double delivery with the gateway's own local broadcast.

use keysync::{StorageEvent, StorageGateway, StoreError, StoreOp};
use wasm_bindgen::{JsCast, closure::Closure};

use super::web::WebStorage;

/// Forward `storage` events for the gateway's area into `dispatch_remote`.
///
/// The listener lives for the rest of the page.
pub(super) fn forward_to(gateway: &StorageGateway<WebStorage>) -> Result<(), StoreError> {
    let window = web_sys::window().ok_or(StoreError::Unavailable)?;
    let gateway = gateway.clone();
    let area = gateway.backend().raw().clone();

    let cb = Closure::wrap(Box::new(move |ev: web_sys::StorageEvent| {
        // localStorage and sessionStorage share the event name.
        if let Some(source) = ev.storage_area() {
            if !js_sys::Object::is(&source, &area) {
                return;
            }
        }
        gateway.dispatch_remote(&StorageEvent { key: ev.key(), new_value: ev.new_value() });
    }) as Box<dyn FnMut(web_sys::StorageEvent)>);

    window
        .add_event_listener_with_callback("storage", cb.as_ref().unchecked_ref())
        .map_err(|e| StoreError::Access {
            op: StoreOp::Read,
            key: String::new(),
            message: e.as_string().unwrap_or_else(|| "addEventListener failed".into()),
        })?;
    cb.forget();
    Ok(())
}
