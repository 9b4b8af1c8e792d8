//! Logging through the browser console.
//!
//! Outside the browser there is no console to call into and messages are dropped.
#![cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]

pub fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    gloo::console::log!(message);
}

pub fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    gloo::console::warn!(message);
}

pub fn error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    gloo::console::error!(message);
}
