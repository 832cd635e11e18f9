//! tc-api: HTTP surface for Travel Companion
//!
//! Serves the single-page UI and the JSON session API it talks to.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
mod page;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, build_router, start_server};
