//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Background task spawning and layout helpers
//! - `render` - Layout and overlay dispatch
//! - `posts` - Post table widget
//! - `form` - Add/edit overlay
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget

mod events;
mod form;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod posts;
mod render;
mod status;

pub use loop_runner::{run, Action};
