//! Web UI for cfu-csv
//!
//! A Yew-based page that converts a CFU budget XML file, picked by the user,
//! into downloadable raw and SCDL CSV exports. Everything runs in the
//! browser; nothing is uploaded.

mod app;
mod components;
pub mod download;

use wasm_bindgen::prelude::*;

/// Entry point for the WASM application.
#[wasm_bindgen(start)]
pub fn run_app() {
    // Initialize panic hook for better error messages
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    // Mount the Yew app
    yew::Renderer::<app::App>::new().render();
}
