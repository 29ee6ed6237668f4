//! Bookshop inventory service.
//!
//! Wires the book store, the books module, and the HTTP server together.

pub mod app;
pub mod modules;

pub use app::{build_registry, open_store, run};
