//! Browser instance manager.
//!
//! Launches Chrome with a persistent profile so the AI sites stay logged in,
//! connects lazily and tracks the tabs that host the frames.

mod manager_core;
mod manager_pages;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
