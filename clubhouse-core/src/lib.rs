//! Clubhouse Core - Core data structures and trait definitions
//!
//! Shared by the authorization crate and the web server: errors, logging,
//! configuration, documents and the collaborator traits the server consumes.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;
pub mod validation;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;
pub use validation::{FieldErrors, Validate};

// Re-export commonly used external types
pub use async_trait::async_trait;
