//! Place identification from an image

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::llm::{Content, GenerateContentRequest, GenerationConfig, ImageData, VertexClient};

/// Prompt sent alongside the image
pub const IDENTIFY_PROMPT: &str = "What is this place and where is it located?
Output the name, description, and location with city, state, country.";

/// Where an identified place is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Location {
    /// `"{city}, {state}, {country}"`
    pub fn display(&self) -> String {
        [self.city.as_str(), self.state.as_str(), self.country.as_str()].join(", ")
    }
}

/// Structured result of identifying a photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub name: String,
    pub description: String,
    pub location: Location,
}

/// Image-understanding service
#[async_trait]
pub trait PlaceIdentifier: Send + Sync {
    /// Identify the place shown in `image`
    async fn identify(&self, image: &ImageData) -> Result<Identification>;
}

/// Fixed sampling parameters for identification
pub fn generation_config() -> GenerationConfig {
    GenerationConfig {
        max_output_tokens: Some(8192),
        temperature: Some(1.0),
        top_p: Some(0.95),
        response_mime_type: Some("application/json".to_string()),
    }
}

/// Parse model output into an [`Identification`].
///
/// Every field, including all three location parts, must be present.
pub fn parse_identification(text: &str) -> Result<Identification> {
    serde_json::from_str(text.trim()).map_err(|e| {
        warn!("Identification output did not parse: {}", e);
        Error::MalformedModelOutput(e.to_string())
    })
}

/// [`PlaceIdentifier`] backed by Gemini on Vertex AI
#[derive(Clone)]
pub struct GeminiPlaceIdentifier {
    client: VertexClient,
}

impl GeminiPlaceIdentifier {
    pub fn new(client: VertexClient) -> Self {
        Self { client }
    }

    /// Request sent for `image`
    pub fn build_request(image: &ImageData) -> GenerateContentRequest {
        GenerateContentRequest::new(vec![Content::user_with_image(image, IDENTIFY_PROMPT)])
            .with_generation_config(generation_config())
    }
}

#[async_trait]
impl PlaceIdentifier for GeminiPlaceIdentifier {
    async fn identify(&self, image: &ImageData) -> Result<Identification> {
        debug!("Identifying {} image", image.mime_type);
        let text = self.client.generate_text(&Self::build_request(image)).await?;
        parse_identification(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EIFFEL: &str = r#"{"name":"Eiffel Tower","description":"An iron lattice tower","location":{"city":"Paris","state":"Île-de-France","country":"France"}}"#;

    #[test]
    fn test_parse_identification() {
        let id = parse_identification(EIFFEL).unwrap();
        assert_eq!(id.name, "Eiffel Tower");
        assert_eq!(id.description, "An iron lattice tower");
        assert_eq!(id.location.display(), "Paris, Île-de-France, France");
    }

    #[test]
    fn test_parse_identification_surrounding_whitespace() {
        let text = format!("\n  {}  \n", EIFFEL);
        assert!(parse_identification(&text).is_ok());
    }

    #[test]
    fn test_parse_identification_invalid_json() {
        let err = parse_identification("The Eiffel Tower in Paris").unwrap_err();
        assert!(matches!(err, Error::MalformedModelOutput(_)));
    }

    #[test]
    fn test_parse_identification_missing_field() {
        let text = r#"{"name":"Eiffel Tower","description":"A tower","location":{"city":"Paris","country":"France"}}"#;
        let err = parse_identification(text).unwrap_err();
        assert!(matches!(err, Error::MalformedModelOutput(msg) if msg.contains("state")));
    }

    #[test]
    fn test_build_request() {
        let image = ImageData::from_bytes(ImageData::MEDIA_TYPE_PNG, b"png");
        let request = GeminiPlaceIdentifier::build_request(&image);

        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].inline_data.as_ref().unwrap().mime_type, "image/png");
        assert_eq!(parts[1].text.as_deref(), Some(IDENTIFY_PROMPT));

        let config = request.generation_config.unwrap();
        assert_eq!(config.max_output_tokens, Some(8192));
        assert_eq!(config.temperature, Some(1.0));
        assert_eq!(config.top_p, Some(0.95));
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
    }
}
