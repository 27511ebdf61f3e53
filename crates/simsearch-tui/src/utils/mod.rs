//! String formatting helpers for the TUI.

pub mod format;

pub use format::truncate;
