//! Padi companion: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters, hands them to the core managers,
//! and exposes the result to the page as the `Companion` handle.

mod app;
mod bindings;

#[cfg(test)]
mod tests;

pub use app::{AppPorts, CompanionApp};
pub use bindings::Companion;

use wasm_bindgen::prelude::*;

/// WASM entry point, run when the module is instantiated
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Padi companion starting...");
}
