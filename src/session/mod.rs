//! Session ownership.

pub mod actor;
mod core;

pub use actor::{SessionHandle, SessionInfo};
pub use self::core::SessionState;
