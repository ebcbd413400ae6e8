//! Wire types of the Hubble API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response of `GET v1/users/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<UserSpec>,
}

impl UserMe {
    /// First name from `spec.firstName`, empty when the server sent none.
    pub fn first_name(&self) -> &str {
        self.spec.as_ref().map(|s| s.first_name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub self_link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

/// Structured error envelope. The service may send it with any HTTP status,
/// including 200.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

impl ApiError {
    /// Parse `body` as an error envelope. Returns `None` unless it is a JSON
    /// object with a non-empty `code`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let err: ApiError = serde_json::from_value(value.clone()).ok()?;
        (!err.code.is_empty()).then_some(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_me_from_wire() {
        let json = r#"{
            "metadata": {"name": "ada", "uid": "u-1", "resourceVersion": "7"},
            "spec": {"firstName": "Ada", "lastName": "Lovelace", "emailId": "a@x.io", "roles": ["admin"]}
        }"#;
        let user: UserMe = serde_json::from_str(json).unwrap();
        let spec = user.spec.as_ref().unwrap();
        assert_eq!(user.first_name(), "Ada");
        assert_eq!(spec.email_id, "a@x.io");
        assert_eq!(spec.roles, vec!["admin".to_string()]);
        let meta = user.metadata.unwrap();
        assert_eq!(meta.uid, "u-1");
        assert_eq!(meta.resource_version, "7");
    }

    #[test]
    fn test_user_me_without_spec() {
        let user: UserMe = serde_json::from_str("{}").unwrap();
        assert!(user.spec.is_none());
        assert_eq!(user.first_name(), "");
    }

    #[test]
    fn test_user_spec_serializes_camel_case() {
        let spec = UserSpec {
            email_id: "a@x.io".into(),
            first_name: "Ada".into(),
            last_name: String::new(),
            roles: vec![],
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["emailId"], "a@x.io");
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("lastName").is_none());
        assert!(json["roles"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_api_error_requires_code() {
        let err = ApiError::from_body(br#"{"code":"403","message":"forbidden","ref":"r-1"}"#).unwrap();
        assert_eq!(err.code, "403");
        assert_eq!(err.reference, "r-1");
        assert_eq!(err.to_string(), "403: forbidden");

        assert!(ApiError::from_body(br#"{"code":"","message":"x"}"#).is_none());
        assert!(ApiError::from_body(br#"{"spec":{"firstName":"Ada"}}"#).is_none());
        assert!(ApiError::from_body(b"apiVersion: v1\nkind: Config").is_none());
        assert!(ApiError::from_body(b"[1,2]").is_none());
    }

    #[test]
    fn test_api_error_keeps_details() {
        let err = ApiError::from_body(br#"{"code":"400","message":"bad","details":{"field":"uid"}}"#)
            .unwrap();
        assert_eq!(err.details.unwrap()["field"], "uid");
    }
}
