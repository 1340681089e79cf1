//! ZPD Web Bindings
//!
//! Drives [`zpd_core::ZpdController`] from the browser: a DOM-backed
//! surface, event listeners, a `requestAnimationFrame` loop for
//! transitions and a JavaScript API mirroring the paper methods
//! (`zpd`, `zoomTo`, `panTo`, `rotate`, ...).

pub mod convert;

#[cfg(target_arch = "wasm32")]
mod api;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod events;
#[cfg(target_arch = "wasm32")]
mod runtime;
#[cfg(target_arch = "wasm32")]
mod sandbox;

#[cfg(target_arch = "wasm32")]
pub use api::{ZpdPaper, ZpdRuntime};
#[cfg(target_arch = "wasm32")]
pub use dom::{DomListeners, DomSurface};
#[cfg(target_arch = "wasm32")]
pub use sandbox::Sandbox;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Module initialisation: panic hook and console logging.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"zpd: logger already initialized".into());
    }

    log::info!("zpd-web {} loaded", env!("CARGO_PKG_VERSION"));
}
