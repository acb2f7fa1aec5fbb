//! CryptoVisual Library
//!
//! Market data, the freshness cache, the local portfolio and the terminal UI.
//! The binary in `main.rs` wires these together; integration tests use them
//! directly.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod portfolio;
pub mod refresh;
pub mod ui;
