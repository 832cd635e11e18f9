//! OAuth access tokens for Vertex AI

use chrono::{DateTime, Duration, Utc};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// gcloud tokens live for an hour; refresh well before that
const TOKEN_LIFETIME_MINUTES: i64 = 45;

/// Supplies bearer tokens, either fixed or minted by the gcloud CLI
pub struct TokenSource {
    static_token: Option<String>,
    cached: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl TokenSource {
    /// Always hand out the given token
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            static_token: Some(token.into()),
            cached: Mutex::new(None),
        }
    }

    /// Mint tokens with `gcloud auth print-access-token`
    pub fn gcloud() -> Self {
        Self {
            static_token: None,
            cached: Mutex::new(None),
        }
    }

    /// Pick a source from an optional configured token
    pub fn from_config(token: Option<&str>) -> Self {
        match token {
            Some(t) => Self::fixed(t),
            None => Self::gcloud(),
        }
    }

    /// Current token, refreshing the cached gcloud token when stale
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let mut cached = self.cached.lock().await;
        if let Some((token, expires_at)) = cached.as_ref() {
            if Utc::now() < *expires_at {
                return Ok(token.clone());
            }
            debug!("Cached access token expired");
        }

        let token = Self::print_access_token().await?;
        let expires_at = Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES);
        *cached = Some((token.clone(), expires_at));
        info!("Obtained access token from gcloud");

        Ok(token)
    }

    async fn print_access_token() -> Result<String> {
        let output = Command::new("gcloud")
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| Error::Auth(format!("Failed to run gcloud: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Auth(format!(
                "gcloud exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(Error::Auth("gcloud returned an empty token".to_string()));
        }
        Ok(token)
    }
}
