//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error                                        |
//! | 2    | Usage error: missing parameter, bad endpoint         |
//! | 3    | Hubble rejected the request (error envelope, 4xx/5xx)|
//! | 4    | Network error: connection, TLS handshake, timeout    |
//! | 5    | Client certificate could not be loaded               |
//! | 6    | Configuration file unreadable or invalid             |

use hubble_client::HubbleError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - missing identity parameter, malformed endpoint.
pub const EXIT_USAGE: u8 = 2;

/// Remote error - Hubble answered with an error envelope or status.
pub const EXIT_REMOTE: u8 = 3;

/// Network error - request never got an answer.
pub const EXIT_NETWORK: u8 = 4;

/// Certificate error - TLS material unreadable or invalid.
pub const EXIT_CERTIFICATE: u8 = 5;

/// Config error - config file unreadable or not valid TOML.
pub const EXIT_CONFIG: u8 = 6;

/// Map a client error to its exit code.
pub fn hubble_exit_code(err: &HubbleError) -> u8 {
    match err {
        HubbleError::Validation(_) | HubbleError::InvalidUrl(..) => EXIT_USAGE,
        HubbleError::RemoteApi(_)
        | HubbleError::Status { .. }
        | HubbleError::EmptyResult(_)
        | HubbleError::Decode { .. } => EXIT_REMOTE,
        HubbleError::Transport(_) | HubbleError::Cancelled | HubbleError::DeadlineExceeded => {
            EXIT_NETWORK
        }
        HubbleError::CertificateLoad { .. } => EXIT_CERTIFICATE,
        HubbleError::Encode(_) | HubbleError::Io(_) => EXIT_ERROR,
    }
}
