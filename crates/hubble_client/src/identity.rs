//! Identity resolution: token → user profile + cluster kubeconfig.
//!
//! Two calls through [`Client`], then the session is stored. A session is
//! only stored once both calls have succeeded.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine as _;
use chrono::Utc;
use hubble_config::{Config, TlsSettings};
use log::info;

use crate::client::{Client, ResponseParts};
use crate::context::Context;
use crate::error::{HubbleError, Result};
use crate::models::{ApiError, UserMe};
use crate::session::{Session, SessionStore};
use crate::util::build_url;

/// Inputs of an identity resolution. All fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityParams {
    pub token: String,
    pub user_uid: String,
    pub project_uid: String,
    pub cluster_uid: String,
    pub endpoint: String,
}

impl IdentityParams {
    /// Read params from query-style values, taking the first value of
    /// `Authorization`, `userUid`, `projectUid`, `spectroClusterUid` and
    /// `endpoint`.
    pub fn from_query(query: &HashMap<String, Vec<String>>) -> Self {
        let first = |key: &str| {
            query
                .get(key)
                .and_then(|values| values.first())
                .cloned()
                .unwrap_or_default()
        };
        Self {
            token: first("Authorization"),
            user_uid: first("userUid"),
            project_uid: first("projectUid"),
            cluster_uid: first("spectroClusterUid"),
            endpoint: first("endpoint"),
        }
    }

    /// Fails on the first empty field, in declaration order.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (&self.token, "Authorization Token"),
            (&self.user_uid, "User Uid"),
            (&self.project_uid, "Project Uid"),
            (&self.cluster_uid, "SpectroCluster Uid"),
            (&self.endpoint, "Endpoint"),
        ];
        for (value, name) in fields {
            if value.trim().is_empty() {
                return Err(HubbleError::empty_property(name));
            }
        }
        Ok(())
    }
}

/// Resolves sessions against the endpoint named in each request.
pub struct IdentityResolver {
    tls: TlsSettings,
    store: Arc<SessionStore>,
    context: Context,
}

impl IdentityResolver {
    pub fn new(config: &Config, store: Arc<SessionStore>) -> Self {
        Self {
            tls: config.tls().clone(),
            store,
            context: Context::background(),
        }
    }

    /// Use `context` for every request this resolver makes.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Validate, fetch the user and kubeconfig, then store the session.
    pub fn resolve(&self, params: &IdentityParams) -> Result<Session> {
        params.validate()?;

        let client = self.client_for(&params.endpoint)?;
        let user = self.fetch_user(&client, params)?;
        let kube_config = self.fetch_kube_config(&client, params)?;

        let created_at = Utc::now();
        let name = Session::derive_name(user.first_name(), &created_at);
        let session = Session {
            name: name.clone(),
            token: params.token.clone(),
            user_uid: params.user_uid.clone(),
            project_uid: params.project_uid.clone(),
            cluster_uid: params.cluster_uid.clone(),
            created_at,
            user,
            kube_config: base64::engine::general_purpose::STANDARD.encode(kube_config),
        };

        self.store.put(name.clone(), session.clone());
        info!("stored session {} for cluster {}", name, params.cluster_uid);
        Ok(session)
    }

    fn client_for(&self, endpoint: &str) -> Result<Client> {
        if self.tls.has_client_certificate() {
            Client::with_certs(
                endpoint,
                &self.tls.certificate,
                &self.tls.certificate_key,
                self.tls.is_insecure,
            )
        } else {
            Client::new(endpoint)
        }
    }

    fn fetch_user(&self, client: &Client, params: &IdentityParams) -> Result<UserMe> {
        let path = build_url("v1/users/me", &[("Authorization", params.token.as_str())]);
        let (parts, body): (ResponseParts, serde_json::Value) =
            client.get_json(&self.context, &path)?;

        if let Some(api_error) = ApiError::from_value(&body) {
            return Err(HubbleError::RemoteApi(api_error));
        }
        if parts.is_error() {
            return Err(HubbleError::Status { status: parts.status, body: body.to_string() });
        }

        serde_json::from_value(body).map_err(|source| HubbleError::Decode { response: parts, source })
    }

    fn fetch_kube_config(&self, client: &Client, params: &IdentityParams) -> Result<String> {
        let path = build_url(
            &format!("v1/spectroclusters/{}/assets/kubeconfig", params.cluster_uid),
            &[("Authorization", params.token.as_str()), ("ProjectUid", params.project_uid.as_str())],
        );

        let text = match client.get_str(&self.context, &path) {
            Ok(text) => text,
            Err(HubbleError::Status { status, body }) => {
                return Err(match ApiError::from_body(body.as_bytes()) {
                    Some(api_error) => HubbleError::RemoteApi(api_error),
                    None => HubbleError::Status { status, body },
                });
            }
            Err(e) => return Err(e),
        };

        if let Some(api_error) = ApiError::from_body(text.as_bytes()) {
            return Err(HubbleError::RemoteApi(api_error));
        }
        if text.is_empty() {
            return Err(HubbleError::EmptyResult("KubeConfig".into()));
        }
        Ok(text)
    }
}

/// Resolve a session with a one-off resolver.
pub fn resolve_identity(
    params: &IdentityParams,
    config: &Config,
    store: Arc<SessionStore>,
) -> Result<Session> {
    IdentityResolver::new(config, store).resolve(params)
}
