//! Session module
//!
//! Per-user session state and the in-memory registry that owns it.

mod manager;
mod types;

pub use manager::{SessionHandle, SessionManager};
pub use types::{Phase, Session, UploadedImage};
