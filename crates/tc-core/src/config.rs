//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `travel-companion.toml`
//! 3. Defaults
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "travel-companion.toml";

/// Vertex AI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    /// Google Cloud project (`PROJECT_ID`)
    pub project_id: String,

    /// Vertex AI region (`REGION`)
    pub region: String,

    /// Model to use for both identification and the weather agent
    #[serde(default = "default_model")]
    pub model: String,

    /// Static OAuth access token; falls back to gcloud when unset
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Base URL override (proxies, tests)
    pub base_url: Option<String>,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: String::new(),
            model: default_model(),
            access_token: None,
            base_url: None,
        }
    }
}

impl VertexConfig {
    /// Endpoint prefix up to (and excluding) `/models/...`
    pub fn endpoint_base(&self) -> String {
        let host = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com/v1", self.region),
        };
        format!(
            "{}/projects/{}/locations/{}/publishers/google",
            host, self.project_id, self.region
        )
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted image upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Sessions idle longer than this are dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// Main configuration for travel-companion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vertex: VertexConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_model() -> String {
    "gemini-1.5-flash-001".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_session_ttl_secs() -> u64 {
    3600
}

impl Config {
    /// Expand `${VAR_NAME}` references from the environment.
    ///
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                while let Some(c) = chars.next() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut cfg = Self::from_toml_config(config);
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load from `./travel-companion.toml` if present, otherwise from the environment
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Self::from_env()
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let vertex = toml.vertex.unwrap_or_default();
        let server = toml.server.unwrap_or_default();

        Config {
            vertex: VertexConfig {
                project_id: vertex.project_id.unwrap_or_default(),
                region: vertex.region.unwrap_or_default(),
                model: vertex.model.unwrap_or_else(default_model),
                access_token: vertex.access_token.filter(|t| !t.is_empty()),
                base_url: vertex.base_url.filter(|u| !u.is_empty()),
            },
            server: ServerConfig {
                host: server.host.unwrap_or_else(default_host),
                port: server.port.unwrap_or_else(default_port),
                max_upload_bytes: server
                    .max_upload_bytes
                    .unwrap_or_else(default_max_upload_bytes),
                session_ttl_secs: server
                    .session_ttl_secs
                    .unwrap_or_else(default_session_ttl_secs),
            },
        }
    }

    /// Environment variables win over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(project_id) = std::env::var("PROJECT_ID") {
            if !project_id.is_empty() {
                self.vertex.project_id = project_id;
            }
        }
        if let Ok(region) = std::env::var("REGION") {
            if !region.is_empty() {
                self.vertex.region = region;
            }
        }
        if let Ok(model) = std::env::var("MODEL") {
            if !model.is_empty() {
                self.vertex.model = model;
            }
        }
        if let Ok(token) = std::env::var("VERTEX_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.vertex.access_token = Some(token);
            }
        }
        if let Ok(base_url) = std::env::var("VERTEX_BASE_URL") {
            if !base_url.is_empty() {
                self.vertex.base_url = Some(base_url);
            }
        }

        if let Ok(host) = std::env::var("HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(limit) = std::env::var("MAX_UPLOAD_BYTES") {
            if let Ok(n) = limit.parse() {
                self.server.max_upload_bytes = n;
            }
        }
        if let Ok(ttl) = std::env::var("SESSION_TTL_SECS") {
            if let Ok(n) = ttl.parse() {
                self.server.session_ttl_secs = n;
            }
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// `PROJECT_ID` and `REGION` are required to reach Vertex AI
    pub fn validate(&self) -> crate::Result<()> {
        if self.vertex.project_id.trim().is_empty() {
            return Err(Error::Config("PROJECT_ID not set".to_string()));
        }
        if self.vertex.region.trim().is_empty() {
            return Err(Error::Config("REGION not set".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    vertex: Option<TomlVertexConfig>,
    server: Option<TomlServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlVertexConfig {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    max_upload_bytes: Option<usize>,
    #[serde(default)]
    session_ttl_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_config_default() {
        let config = VertexConfig::default();
        assert_eq!(config.model, "gemini-1.5-flash-001");
        assert!(config.access_token.is_none());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8501);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.session_ttl_secs, 3600);
    }

    #[test]
    fn test_endpoint_base_regional() {
        let config = VertexConfig {
            project_id: "my-project".to_string(),
            region: "us-central1".to_string(),
            ..VertexConfig::default()
        };
        assert_eq!(
            config.endpoint_base(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/my-project/locations/us-central1/publishers/google"
        );
    }

    #[test]
    fn test_endpoint_base_override() {
        let config = VertexConfig {
            project_id: "p".to_string(),
            region: "europe-west4".to_string(),
            base_url: Some("http://localhost:9000/v1/".to_string()),
            ..VertexConfig::default()
        };
        assert_eq!(
            config.endpoint_base(),
            "http://localhost:9000/v1/projects/p/locations/europe-west4/publishers/google"
        );
    }

    #[test]
    fn test_validate_requires_project_and_region() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.vertex.project_id = "p".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(msg)) if msg.contains("REGION")));

        config.vertex.region = "us-central1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("TC_CONFIG_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${TC_CONFIG_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        let result = Config::expand_env_vars("prefix_${TC_CONFIG_NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("TC_CONFIG_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        assert_eq!(Config::expand_env_vars("no_vars_here"), "no_vars_here");
        assert_eq!(Config::expand_env_vars("cost $5"), "cost $5");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[vertex]
project_id = "travel-demo"
region = "asia-northeast1"
model = "gemini-1.5-pro-001"
access_token = ""

[server]
host = "0.0.0.0"
port = 9000
max_upload_bytes = 1048576
"#;

        let toml_config: TomlConfig = toml::from_str(toml_content).unwrap();
        let config = Config::from_toml_config(toml_config);

        assert_eq!(config.vertex.project_id, "travel-demo");
        assert_eq!(config.vertex.region, "asia-northeast1");
        assert_eq!(config.vertex.model, "gemini-1.5-pro-001");
        assert!(config.vertex.access_token.is_none());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes, 1048576);
        assert_eq!(config.server.session_ttl_secs, 3600);
    }

    #[test]
    fn test_toml_config_empty_uses_defaults() {
        let toml_config: TomlConfig = toml::from_str("").unwrap();
        let config = Config::from_toml_config(toml_config);

        assert_eq!(config.vertex.model, "gemini-1.5-flash-001");
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_toml_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel-companion.toml");
        std::fs::write(
            &path,
            "[vertex]\nproject_id = \"file\"\nregion = \"europe-west1\"\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("PROJECT_ID", "env");
            std::env::set_var("PORT", "not-a-port");
        }

        let result = Config::from_toml_file(&path);

        unsafe {
            std::env::remove_var("PROJECT_ID");
            std::env::remove_var("PORT");
        }

        let config = result.unwrap();
        assert_eq!(config.vertex.project_id, "env");
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel-companion.toml");
        std::fs::write(&path, "[vertex\nproject_id = ").unwrap();

        let result = Config::from_toml_file(&path);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("TOML")));
    }
}
