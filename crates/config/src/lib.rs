// Configuration loading

pub mod hubble;

pub use hubble::{config_file_path, Config, ConfigError, HubbleSettings, TlsSettings, ENDPOINT_ENV};
