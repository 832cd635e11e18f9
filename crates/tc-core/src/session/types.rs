//! Session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identify::Identification;
use crate::llm::{Content, ImageData};

/// Image held by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Accepted upload types
    pub const ACCEPTED_TYPES: [&'static str; 2] =
        [ImageData::MEDIA_TYPE_JPEG, ImageData::MEDIA_TYPE_PNG];

    /// Accept JPEG or PNG, rejecting any other declared type
    pub fn new(mime_type: &str, bytes: Vec<u8>) -> Result<Self> {
        let parsed: mime::Mime = mime_type
            .parse()
            .map_err(|_| Error::UnsupportedImageType(mime_type.to_string()))?;

        // image/jpg is not registered but browsers and users send it
        let essence = match parsed.essence_str() {
            "image/jpg" | "image/pjpeg" => ImageData::MEDIA_TYPE_JPEG,
            other => other,
        };

        if !Self::ACCEPTED_TYPES.iter().any(|accepted| *accepted == essence) {
            return Err(Error::UnsupportedImageType(mime_type.to_string()));
        }

        Ok(Self {
            mime_type: essence.to_string(),
            bytes,
        })
    }

    /// Accept a file by its extension (jpg, jpeg, png)
    pub fn from_extension(extension: &str, bytes: Vec<u8>) -> Result<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::new(ImageData::MEDIA_TYPE_JPEG, bytes),
            "png" => Self::new(ImageData::MEDIA_TYPE_PNG, bytes),
            other => Err(Error::UnsupportedImageType(format!(".{}", other))),
        }
    }

    /// Base64-encode for the model
    pub fn encode(&self) -> ImageData {
        ImageData::from_bytes(self.mime_type.clone(), &self.bytes)
    }
}

/// Where a session is in the upload → identify → weather flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NoImage,
    ImageUploaded,
    Identified,
    WeatherShown,
}

/// State for one interactive user visit
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// Current image, if any
    pub uploaded_image: Option<UploadedImage>,
    /// Set only after a successful identification of `uploaded_image`
    pub identification: Option<Identification>,
    /// Last weather answer for the identified place
    pub weather: Option<String>,
    /// Reserved for multi-turn weather follow-ups; never populated
    pub chat_history: Vec<Content>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a session with everything unset
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            uploaded_image: None,
            identification: None,
            weather: None,
            chat_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.uploaded_image, &self.identification, &self.weather) {
            (None, _, _) => Phase::NoImage,
            (Some(_), None, _) => Phase::ImageUploaded,
            (Some(_), Some(_), None) => Phase::Identified,
            (Some(_), Some(_), Some(_)) => Phase::WeatherShown,
        }
    }

    /// Drop everything derived from the current image
    pub fn reset_results(&mut self) {
        self.identification = None;
        self.weather = None;
        self.chat_history.clear();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
