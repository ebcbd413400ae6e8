//! Resolved sessions and the store that holds them.
//!
//! Entries are never expired or evicted. A later session with the same
//! derived name replaces the earlier one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::models::UserMe;

/// Identity and kubeconfig resolved for one token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// `{firstName}-{unix seconds}`
    pub name: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub user_uid: String,
    pub project_uid: String,
    pub cluster_uid: String,
    pub created_at: DateTime<Utc>,
    pub user: UserMe,
    /// Base64 (standard alphabet) of the kubeconfig text
    pub kube_config: String,
}

impl Session {
    /// Derive the store key from a first name and creation time.
    pub fn derive_name(first_name: &str, created_at: &DateTime<Utc>) -> String {
        format!("{}-{}", first_name, created_at.timestamp())
    }
}

/// Thread-safe map from session name to session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, name: impl Into<String>, session: Session) {
        self.sessions.write().insert(name.into(), session);
    }

    pub fn get(&self, name: &str) -> Option<Session> {
        self.sessions.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sessions.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Session names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.read().keys().cloned().collect();
        names.sort();
        names
    }
}
