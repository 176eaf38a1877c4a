//! HTTP request handlers
//!
//! Write handlers follow one order: validate the body, authorize the
//! caller, perform the write, then record an audit entry.

pub mod audit_logs;
pub mod documents;
pub mod health;
pub mod members;
pub mod session;
pub mod users;

pub use audit_logs::*;
pub use documents::*;
pub use health::*;
pub use members::*;
pub use session::*;
pub use users::*;
