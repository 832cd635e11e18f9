//! Error types for tc-core

use thiserror::Error;

/// Main error type for tc-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Vertex AI error: {0}")]
    VertexApi(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The identification response was not a complete JSON record
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// The weather agent could not be reached or gave no usable answer
    #[error("Weather unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("No image has been uploaded")]
    NoImage,

    #[error("Place has not been identified yet")]
    NotIdentified,

    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for tc-core
pub type Result<T> = std::result::Result<T, Error>;
