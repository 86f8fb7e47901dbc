//! JSON bodies exchanged over HTTP.
//!
//! Request fields default to empty strings so that a missing field reaches
//! the core validation instead of failing deserialization.

use serde::{Deserialize, Serialize};

/// Header carrying the acting participant's name.
pub const USER_HEADER: &str = "user";

/// Body of `POST /participants`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /messages`. The sender comes from the `User` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Query string of `GET /messages`.
///
/// `limit` stays textual so that malformed values are reported as
/// validation errors by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Error code and human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    /// Create an error body.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"to":"Todos"}"#).unwrap();
        assert_eq!(req.to, "Todos");
        assert!(req.text.is_empty());
        assert!(req.kind.is_empty());

        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(req.name.is_empty());
    }

    #[test]
    fn test_type_field_rename() {
        let req: SendMessageRequest =
            serde_json::from_str(r#"{"to":"Bob","text":"oi","type":"private_message"}"#).unwrap();
        assert_eq!(req.kind, "private_message");
    }
}
