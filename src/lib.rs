//! Record notes: in-page note submission for server-rendered record pages.
//!
//! Binds the "add note" triggers, posts the note, and merges the server's
//! rendered fragment into the visible list without a page reload. Scrollable
//! note regions are kept pinned to their newest entry while the reader is at
//! the bottom.

mod api;
mod app;
mod binding;
mod config;
mod dom;
mod scroll;
mod submit;
mod sync;
mod target;
mod token;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    // No `mount_to_body` here, so the task executor is not set up for us.
    let _ = any_spawner::Executor::init_wasm_bindgen();
    app::start();
}
