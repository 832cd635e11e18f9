//! Session orchestrator
//!
//! Drives a [`Session`] through upload → identify → weather, calling each
//! external service once per state transition. Session state is passed in by
//! the caller; the orchestrator itself only holds the two collaborators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{GeminiAgent, WeatherAgent, weather_prompt};
use crate::error::{Error, Result};
use crate::identify::{GeminiPlaceIdentifier, Identification, PlaceIdentifier};
use crate::llm::VertexClient;
use crate::session::{Phase, Session, UploadedImage};

/// Display form of an identification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationView {
    pub name: String,
    pub description: String,
    /// `"{city}, {state}, {country}"`
    pub location: String,
}

/// Display form of the weather answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherView {
    pub city: String,
    pub report: String,
}

/// Everything the page shows for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub phase: Phase,
    pub has_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    pub identification: Option<IdentificationView>,
    pub weather: Option<WeatherView>,
}

/// Sequences the identification and weather calls for a session
#[derive(Clone)]
pub struct Orchestrator {
    identifier: Arc<dyn PlaceIdentifier>,
    agent: Arc<dyn WeatherAgent>,
}

impl Orchestrator {
    pub fn new(identifier: Arc<dyn PlaceIdentifier>, agent: Arc<dyn WeatherAgent>) -> Self {
        Self { identifier, agent }
    }

    /// Gemini-backed identifier and agent sharing one client
    pub fn with_client(client: VertexClient) -> Self {
        Self::new(
            Arc::new(GeminiPlaceIdentifier::new(client.clone())),
            Arc::new(GeminiAgent::new(client)),
        )
    }

    /// Store `image` in the session.
    ///
    /// A different image clears identification, weather and chat history.
    /// Re-uploading the same content keeps them. Returns whether the stored
    /// image changed.
    pub fn upload_image(&self, session: &mut Session, image: UploadedImage) -> bool {
        let replaced = session.uploaded_image.as_ref() != Some(&image);
        if replaced {
            debug!(
                "Session {}: new {} image ({} bytes)",
                session.id,
                image.mime_type,
                image.bytes.len()
            );
            session.reset_results();
            session.uploaded_image = Some(image);
        }
        session.touch();
        replaced
    }

    /// Identify the place in the uploaded image.
    ///
    /// Idempotent: once the session holds an identification this returns it
    /// without calling the service again, until a different image is
    /// uploaded. Fails with [`Error::NoImage`] without an image and with
    /// [`Error::MalformedModelOutput`] when the model answer is not a
    /// complete record; on any failure the identification stays unset.
    pub async fn identify_place(&self, session: &mut Session) -> Result<Identification> {
        if let Some(existing) = &session.identification {
            debug!("Session {}: already identified, skipping call", session.id);
            return Ok(existing.clone());
        }

        let image = match &session.uploaded_image {
            Some(image) => image.encode(),
            None => return Err(Error::NoImage),
        };

        let identification = self.identifier.identify(&image).await.inspect_err(|e| {
            warn!("Session {}: identification failed: {}", session.id, e);
        })?;

        info!(
            "Session {}: identified {} ({})",
            session.id,
            identification.name,
            identification.location.display()
        );
        session.identification = Some(identification.clone());
        session.touch();

        Ok(identification)
    }

    /// Ask the agent for the weather at the identified city.
    ///
    /// Requires an identification; otherwise fails with
    /// [`Error::NotIdentified`] and no query is issued. The answer is
    /// returned verbatim and stored for rendering. Agent failures and empty
    /// answers become [`Error::WeatherUnavailable`] and leave the weather unset.
    pub async fn fetch_weather(&self, session: &mut Session) -> Result<String> {
        let city = match &session.identification {
            Some(identification) => identification.location.city.clone(),
            None => return Err(Error::NotIdentified),
        };

        let result = match self.agent.query(&weather_prompt(&city)).await {
            Ok(response) if !response.output.trim().is_empty() => Ok(response.output),
            Ok(_) => Err(Error::WeatherUnavailable("agent returned an empty answer".to_string())),
            Err(e) => Err(Error::WeatherUnavailable(e.to_string())),
        };
        session.touch();

        match result {
            Ok(output) => {
                info!("Session {}: weather fetched for {}", session.id, city);
                session.weather = Some(output.clone());
                Ok(output)
            }
            Err(e) => {
                warn!("Session {}: {}", session.id, e);
                session.weather = None;
                Err(e)
            }
        }
    }

    /// Identification in display form, `None` when unset
    pub fn render_identification(session: &Session) -> Option<IdentificationView> {
        session
            .identification
            .as_ref()
            .map(|identification| IdentificationView {
                name: identification.name.clone(),
                description: identification.description.clone(),
                location: identification.location.display(),
            })
    }

    /// Weather in display form, `None` when nothing was fetched
    pub fn render_weather(session: &Session) -> Option<WeatherView> {
        let identification = session.identification.as_ref()?;
        let report = session.weather.as_ref()?;
        Some(WeatherView {
            city: identification.location.city.clone(),
            report: report.clone(),
        })
    }

    /// Full read-only view of a session
    pub fn render(session: &Session) -> SessionView {
        SessionView {
            session_id: session.id.clone(),
            phase: session.phase(),
            has_image: session.uploaded_image.is_some(),
            image_type: session.uploaded_image.as_ref().map(|i| i.mime_type.clone()),
            identification: Self::render_identification(session),
            weather: Self::render_weather(session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentResponse;
    use crate::identify::parse_identification;
    use crate::llm::ImageData;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const EIFFEL: &str = r#"{"name":"Eiffel Tower","description":"An iron lattice tower","location":{"city":"Paris","state":"Île-de-France","country":"France"}}"#;

    /// Returns a canned model answer and counts calls
    struct CannedIdentifier {
        output: String,
        calls: AtomicUsize,
        seen: Mutex<Vec<ImageData>>,
    }

    impl CannedIdentifier {
        fn new(output: &str) -> Arc<Self> {
            Arc::new(Self {
                output: output.to_string(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaceIdentifier for CannedIdentifier {
        async fn identify(&self, image: &ImageData) -> Result<Identification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(image.clone());
            parse_identification(&self.output)
        }
    }

    struct CannedAgent {
        output: Option<String>,
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
    }

    impl CannedAgent {
        fn answering(output: &str) -> Arc<Self> {
            Arc::new(Self {
                output: Some(output.to_string()),
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                output: None,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherAgent for CannedAgent {
        async fn query(&self, input: &str) -> Result<AgentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(input.to_string());
            match &self.output {
                Some(output) => Ok(AgentResponse {
                    output: output.clone(),
                }),
                None => Err(Error::VertexApi("503 Service Unavailable".to_string())),
            }
        }
    }

    fn jpeg(bytes: &[u8]) -> UploadedImage {
        UploadedImage::new("image/jpeg", bytes.to_vec()).unwrap()
    }

    fn orchestrator(
        identifier: &Arc<CannedIdentifier>,
        agent: &Arc<CannedAgent>,
    ) -> Orchestrator {
        Orchestrator::new(identifier.clone(), agent.clone())
    }

    #[test]
    fn test_render_nothing_when_unset() {
        let mut session = Session::new();
        assert!(Orchestrator::render_identification(&session).is_none());
        assert!(Orchestrator::render_weather(&session).is_none());

        session.uploaded_image = Some(jpeg(b"img"));
        assert!(Orchestrator::render_identification(&session).is_none());
        assert!(Orchestrator::render_weather(&session).is_none());

        let view = Orchestrator::render(&session);
        assert_eq!(view.phase, Phase::ImageUploaded);
        assert!(view.has_image);
        assert_eq!(view.image_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_identify_renders_eiffel_tower() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("21°C, temperate oceanic climate");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        orchestrator.identify_place(&mut session).await.unwrap();

        let view = Orchestrator::render_identification(&session).unwrap();
        assert_eq!(view.name, "Eiffel Tower");
        assert_eq!(view.description, "An iron lattice tower");
        assert_eq!(view.location, "Paris, Île-de-France, France");

        let seen = identifier.seen.lock().unwrap();
        assert_eq!(seen[0].mime_type, "image/jpeg");
        assert_eq!(seen[0].decode().unwrap(), b"tower");
    }

    #[tokio::test]
    async fn test_identify_is_idempotent() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("sunny");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        let first = orchestrator.identify_place(&mut session).await.unwrap();
        let second = orchestrator.identify_place(&mut session).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(identifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_same_upload_keeps_identification() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("sunny");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        assert!(orchestrator.upload_image(&mut session, jpeg(b"tower")));
        orchestrator.identify_place(&mut session).await.unwrap();

        assert!(!orchestrator.upload_image(&mut session, jpeg(b"tower")));
        assert!(session.identification.is_some());
        orchestrator.identify_place(&mut session).await.unwrap();
        assert_eq!(identifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_new_upload_resets_state() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("sunny");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        orchestrator.identify_place(&mut session).await.unwrap();
        orchestrator.fetch_weather(&mut session).await.unwrap();
        assert_eq!(session.phase(), Phase::WeatherShown);

        assert!(orchestrator.upload_image(&mut session, jpeg(b"bridge")));
        assert!(session.identification.is_none());
        assert!(session.weather.is_none());
        assert!(session.chat_history.is_empty());
        assert_eq!(session.phase(), Phase::ImageUploaded);

        orchestrator.identify_place(&mut session).await.unwrap();
        assert_eq!(identifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_identify_without_image() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("sunny");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        let err = orchestrator.identify_place(&mut session).await.unwrap_err();
        assert!(matches!(err, Error::NoImage));
        assert_eq!(identifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_identify_malformed_output() {
        let identifier = CannedIdentifier::new("{\"name\": \"Eiffel Tower\"");
        let agent = CannedAgent::answering("sunny");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        let err = orchestrator.identify_place(&mut session).await.unwrap_err();

        assert!(matches!(err, Error::MalformedModelOutput(_)));
        assert!(session.identification.is_none());
        assert!(Orchestrator::render_identification(&session).is_none());

        // a failed attempt does not count as identified; the user may retry
        let _ = orchestrator.identify_place(&mut session).await;
        assert_eq!(identifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_weather_requires_identification() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("sunny");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        assert!(matches!(
            orchestrator.fetch_weather(&mut session).await,
            Err(Error::NotIdentified)
        ));

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        assert!(matches!(
            orchestrator.fetch_weather(&mut session).await,
            Err(Error::NotIdentified)
        ));
        assert_eq!(agent.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_weather() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("The temperature in Paris is 21°C. Mild and cloudy.");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        orchestrator.identify_place(&mut session).await.unwrap();
        let report = orchestrator.fetch_weather(&mut session).await.unwrap();

        assert_eq!(report, "The temperature in Paris is 21°C. Mild and cloudy.");
        assert_eq!(
            agent.queries.lock().unwrap()[0],
            "What is the weather in Paris?\nOutput the temperature in Celsius and the climate."
        );

        let view = Orchestrator::render_weather(&session).unwrap();
        assert_eq!(view.city, "Paris");
        assert_eq!(view.report, report);
    }

    #[tokio::test]
    async fn test_fetch_weather_unavailable() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::failing();
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        orchestrator.identify_place(&mut session).await.unwrap();
        let err = orchestrator.fetch_weather(&mut session).await.unwrap_err();

        assert!(matches!(err, Error::WeatherUnavailable(msg) if msg.contains("503")));
        assert!(Orchestrator::render_weather(&session).is_none());
        // the rest of the session survives
        assert!(Orchestrator::render_identification(&session).is_some());
        assert_eq!(session.phase(), Phase::Identified);
    }

    #[tokio::test]
    async fn test_fetch_weather_empty_answer() {
        let identifier = CannedIdentifier::new(EIFFEL);
        let agent = CannedAgent::answering("   ");
        let orchestrator = orchestrator(&identifier, &agent);
        let mut session = Session::new();

        orchestrator.upload_image(&mut session, jpeg(b"tower"));
        orchestrator.identify_place(&mut session).await.unwrap();

        assert!(matches!(
            orchestrator.fetch_weather(&mut session).await,
            Err(Error::WeatherUnavailable(_))
        ));
        assert!(session.weather.is_none());
    }
}
