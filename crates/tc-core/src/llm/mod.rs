//! Vertex AI Gemini client and types

mod auth;
mod client;
mod types;

pub use auth::TokenSource;
pub use client::VertexClient;
pub use types::*;
