//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to Chrome/Chromium via WebSocket and speaks the CDP JSON-RPC
//! protocol. Only the domains the frames need are used: `Target` for tabs,
//! `Page` for navigation and focus, `Runtime` for the page scripts and
//! `Input` for key presses.
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let page = client.new_page(Some("https://chatgpt.com")).await?;
//! let title = page.get_title().await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::{CdpClient, fetch_pages, fetch_version};
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
