// Hubble connection settings
// Loaded from ~/.config/hubble/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `hubble.endpoint`.
pub const ENDPOINT_ENV: &str = "HUBBLE_ENDPOINT";

/// Client TLS material used for mutual-TLS connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Path to the PEM client certificate
    pub certificate: String,

    /// Path to the PEM private key matching `certificate`
    pub certificate_key: String,

    /// Skip server certificate verification
    pub is_insecure: bool,
}

impl TlsSettings {
    /// Returns true when both a certificate and a key path are configured.
    pub fn has_client_certificate(&self) -> bool {
        !self.certificate.trim().is_empty() && !self.certificate_key.trim().is_empty()
    }
}

/// The `[hubble]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubbleSettings {
    /// Service address, `host[:port]` or a full URL
    pub endpoint: String,
    pub tls: TlsSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hubble: HubbleSettings,
}

/// Error loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "invalid config {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
        }
    }
}

/// Returns the default location of the config file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hubble")
        .join("config.toml")
}

impl Config {
    /// Load from the default location.
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply environment overrides (`HUBBLE_ENDPOINT`).
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(ENDPOINT_ENV).ok());
    }

    fn apply_overrides(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.hubble.endpoint = endpoint;
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.hubble.endpoint
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.hubble.tls
    }
}
