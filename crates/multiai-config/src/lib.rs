//! # MultiAI Config
//!
//! Two layers of configuration:
//!
//! - [`Settings`]: the JSON document the host persists for the plugin
//!   (frames, selectors, dialog transcript, prompt history options).
//! - [`Config`]: the TOML runtime configuration (browser, dispatch timing,
//!   collection policy, search limits, file locations).

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
