//! tc-core: Travel Companion core library
//!
//! Vertex AI Gemini client, place identification, the weather agent,
//! per-user session state and the orchestrator that sequences them.

pub mod agent;
pub mod config;
pub mod error;
pub mod identify;
pub mod llm;
pub mod orchestrator;
pub mod session;

pub use agent::{AgentResponse, GeminiAgent, WeatherAgent};
pub use config::{Config, ServerConfig, VertexConfig};
pub use error::{Error, Result};
pub use identify::{GeminiPlaceIdentifier, Identification, Location, PlaceIdentifier};
pub use llm::{ImageData, VertexClient};
pub use orchestrator::{IdentificationView, Orchestrator, SessionView, WeatherView};
pub use session::{Phase, Session, SessionManager, UploadedImage};
