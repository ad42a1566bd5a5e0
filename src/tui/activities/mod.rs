//! Activity modules for the TUI.

pub mod main;

pub use main::{MainActivity, Msg, UserEvent};
