//! Terminal admin console for WordPress posts.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so the integration tests can drive the client and aggregator.

pub mod aggregate;
pub mod api;
pub mod app;
pub mod config;
pub mod forms;
pub mod keybindings;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;
