//! Hubble API client.
//!
//! A blocking HTTP transport for the Hubble management service (plain,
//! mutual-TLS or basic-auth), plus the identity workflow built on it:
//! token → user profile → cluster kubeconfig → stored session.
//!
//! No retries, no backoff. Every call blocks until the round trip ends.

mod client;
mod context;
mod error;
mod identity;
mod models;
mod session;
mod tls;
mod util;

pub use client::{
    Auth, Client, Credentials, Mode, Request, ResponseParts, Transport,
    IDLE_CONNECTION_TIMEOUT,
    is_err_response, is_url_reachable,
};
pub use context::{CancelToken, Context};
pub use error::{HubbleError, Result};
pub use identity::{IdentityParams, IdentityResolver, resolve_identity};
pub use models::{ApiError, ObjectMeta, UserMe, UserSpec};
pub use session::{Session, SessionStore};
pub use tls::{TlsConfig, load_tls_config};
pub use util::{append_path, build_url, delete_file, file_exists};

pub use reqwest::Method;
