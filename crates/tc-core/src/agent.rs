//! Text-in/text-out agent used for the weather lookup

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::llm::{Content, GenerateContentRequest, VertexClient};

/// Agent response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub output: String,
}

/// Text agent answering natural-language queries
#[async_trait]
pub trait WeatherAgent: Send + Sync {
    async fn query(&self, input: &str) -> Result<AgentResponse>;
}

/// Weather question for `city`
pub fn weather_prompt(city: &str) -> String {
    format!(
        "What is the weather in {}?\nOutput the temperature in Celsius and the climate.",
        city
    )
}

/// [`WeatherAgent`] answering with a single Gemini call
#[derive(Clone)]
pub struct GeminiAgent {
    client: VertexClient,
}

impl GeminiAgent {
    pub fn new(client: VertexClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WeatherAgent for GeminiAgent {
    async fn query(&self, input: &str) -> Result<AgentResponse> {
        debug!("Agent query: {}", input);
        let request = GenerateContentRequest::new(vec![Content::user(input)]);
        let output = self.client.generate_text(&request).await?;
        Ok(AgentResponse { output })
    }
}
