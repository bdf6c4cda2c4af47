//! WASM module: the client in the browser
//!
//! Provides the injected-wallet host and the JS-facing `CharityApp`:
//! - `window.ethereum` detection and EIP-1193 request forwarding
//! - `accountsChanged` subscription
//! - JS bindings via wasm-bindgen
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          CharityApp (JS API)            │
//! │  connect, donate, withdraw, refund,     │
//! │  changeOwner, view                      │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │          SessionController              │
//! │  session state + tx lifecycle           │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     InjectedWallet (window.ethereum)    │
//! └─────────────────────────────────────────┘
//! ```

mod app;
mod injected;

pub use app::CharityApp;
pub use injected::{BrowserHost, InjectedWallet};

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
