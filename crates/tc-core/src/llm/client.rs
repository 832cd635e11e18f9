//! Vertex AI HTTP client

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::VertexConfig;
use crate::error::{Error, Result};

use super::auth::TokenSource;
use super::types::*;

/// Client for the Vertex AI `generateContent` endpoint
#[derive(Clone)]
pub struct VertexClient {
    client: Client,
    endpoint_base: String,
    model: String,
    tokens: Arc<TokenSource>,
}

impl VertexClient {
    /// Create a new client from configuration
    pub fn new(config: &VertexConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            endpoint_base: config.endpoint_base(),
            model: config.model.clone(),
            tokens: Arc::new(TokenSource::from_config(config.access_token.as_deref())),
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full `generateContent` URL for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint_base, self.model
        )
    }

    /// Send a `generateContent` request
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint();
        let token = self.tokens.token().await?;

        debug!("Sending request to Vertex AI: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Vertex AI error: {} - {}", status, body);
            return Err(Error::VertexApi(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            Error::VertexApi(format!("Failed to parse response: {} - {}", e, body))
        })?;

        info!(
            "Vertex AI response: model={}, finish_reason={:?}, tokens={}",
            self.model,
            parsed.candidates.first().and_then(|c| c.finish_reason.clone()),
            parsed
                .usage_metadata
                .as_ref()
                .map(|u| u.candidates_token_count)
                .unwrap_or(0)
        );

        Ok(parsed)
    }

    /// Send a request and return the first candidate's text
    pub async fn generate_text(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self.generate_content(request).await?;
        response
            .first_text()
            .ok_or_else(|| Error::VertexApi("Response contained no candidates".to_string()))
    }
}

/// Prefer the message from Google's error envelope over the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope.error.message.unwrap_or_else(|| body.to_string());
            match envelope.error.status {
                Some(status) if !status.is_empty() => format!("{}: {}", status, message),
                _ => message,
            }
        }
        Err(_) => body.to_string(),
    }
}
