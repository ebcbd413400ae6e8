//! Error type shared by the transport client and the identity workflow.

use std::path::PathBuf;

use crate::client::ResponseParts;
use crate::models::ApiError;

/// Error type for Hubble operations.
#[derive(Debug)]
pub enum HubbleError {
    /// A required parameter was missing or empty (no network call was made)
    Validation(String),
    /// Endpoint or request path could not be turned into a URL
    InvalidUrl(String, String),
    /// Client certificate or key could not be loaded
    CertificateLoad { path: PathBuf, reason: String },
    /// Network, TLS handshake or timeout failure from the connection pool
    Transport(reqwest::Error),
    /// The request's context was cancelled
    Cancelled,
    /// The request's deadline passed before the call completed
    DeadlineExceeded,
    /// Request body could not be encoded as JSON
    Encode(serde_json::Error),
    /// Response body was not the expected JSON. The response status and
    /// headers are kept so callers can still inspect them.
    Decode {
        response: ResponseParts,
        source: serde_json::Error,
    },
    /// Server answered with a structured error body carrying a code
    RemoteApi(ApiError),
    /// HTTP status outside 200..=399, with the response body as text
    Status { status: u16, body: String },
    /// A required response value was empty
    EmptyResult(String),
    /// The request worker thread could not be started or died
    Io(std::io::Error),
}

impl HubbleError {
    /// Error for a required property that was not supplied.
    pub fn empty_property(property: &str) -> Self {
        HubbleError::Validation(property.to_string())
    }

    /// True for failures of the connection itself, including cancellation.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HubbleError::Transport(_) | HubbleError::Cancelled | HubbleError::DeadlineExceeded
        )
    }

    /// Response metadata, when the failure happened after a response arrived.
    pub fn response(&self) -> Option<&ResponseParts> {
        match self {
            HubbleError::Decode { response, .. } => Some(response),
            _ => None,
        }
    }
}

impl std::fmt::Display for HubbleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubbleError::Validation(property) => write!(f, "{} cannot be empty", property),
            HubbleError::InvalidUrl(url, reason) => write!(f, "invalid URL {:?}: {}", url, reason),
            HubbleError::CertificateLoad { path, reason } => {
                write!(f, "failed to load certificate {}: {}", path.display(), reason)
            }
            HubbleError::Transport(e) => write!(f, "transport error: {}", e),
            HubbleError::Cancelled => write!(f, "request cancelled"),
            HubbleError::DeadlineExceeded => write!(f, "request deadline exceeded"),
            HubbleError::Encode(e) => write!(f, "failed to encode request body: {}", e),
            HubbleError::Decode { response, source } => {
                write!(f, "failed to decode response (HTTP {}): {}", response.status, source)
            }
            HubbleError::RemoteApi(api) => write!(f, "{}", api),
            HubbleError::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
            HubbleError::EmptyResult(what) => write!(f, "{} cannot be empty", what),
            HubbleError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for HubbleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HubbleError::Transport(e) => Some(e),
            HubbleError::Encode(e) => Some(e),
            HubbleError::Decode { source, .. } => Some(source),
            HubbleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HubbleError {
    fn from(e: reqwest::Error) -> Self {
        HubbleError::Transport(e)
    }
}

pub type Result<T, E = HubbleError> = std::result::Result<T, E>;
