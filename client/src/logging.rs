//! Browser console logging for hydrated apps.

#[cfg(test)]
#[path = "logging_test.rs"]
mod logging_test;

/// Route `log` records to the browser console and install the panic hook.
///
/// Call once from the app's hydrate entry point. No-op outside `hydrate`.
pub fn init(level: log::Level) {
    #[cfg(feature = "hydrate")]
    {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(level) {
            leptos::logging::warn!("console logger already installed: {e}");
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = level;
    }
}
