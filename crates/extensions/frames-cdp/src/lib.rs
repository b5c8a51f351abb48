//! Chrome DevTools Protocol backend for MultiAI.
//!
//! Hosts every AI site in its own Chrome tab and drives it over CDP.
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │  multiai core   │ ◄──────────────► │   Chrome/Edge    │
//! │  (dispatcher,   │       CDP        │  one tab per AI  │
//! │   collector)    │                  │  site            │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! Chrome is launched on demand with `--remote-debugging-port` and a
//! persistent profile under `~/.multiai/browser-profile`, so logins survive
//! between runs. A Chrome already listening on the debug port is used as is,
//! and tabs already showing an AI site are reused.
//!
//! Commands run as fixed page functions (see [`scripts`]) through
//! `Runtime.callFunctionOn`; selectors and prompt text are call arguments.

pub mod cdp;
mod frame;
pub mod manager;
pub mod scripts;
mod workspace;

pub use cdp::{CdpClient, CdpError, PageSession};
pub use frame::CdpFrame;
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig};
pub use workspace::CdpWorkspace;
