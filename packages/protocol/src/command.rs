//! Inbound host commands
//!
//! Hosts post loosely-typed objects. Anything that is not an object with a
//! string `type` is rejected here and dropped by the caller without a reply.

use crate::EditMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const AUTH_TOKEN: &str = "AUTH_TOKEN";
const OPEN_DOC: &str = "OPEN_DOC";
const SET_MODE: &str = "SET_MODE";

/// Commands the host page may send to the embedded editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostCommand {
    /// Establish an authenticated session from an access token
    AuthToken { token: String },

    /// Switch to a document; an empty id closes the current one
    OpenDoc {
        #[serde(rename = "docId")]
        doc_id: String,
    },

    /// Change the interaction mode
    SetMode { mode: EditMode },
}

/// Why an inbound message was not turned into a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("message is not an object")]
    NotAnObject,

    #[error("message has no string `type` field")]
    MissingType,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },
}

impl HostCommand {
    /// Validate and decode a raw inbound message
    pub fn from_message(message: &Value) -> Result<Self, Rejection> {
        let object = message.as_object().ok_or(Rejection::NotAnObject)?;

        let kind = match object.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            _ => return Err(Rejection::MissingType),
        };

        if !matches!(kind, AUTH_TOKEN | OPEN_DOC | SET_MODE) {
            return Err(Rejection::UnknownType(kind.to_string()));
        }

        HostCommand::deserialize(message).map_err(|e| Rejection::InvalidPayload {
            kind: kind.to_string(),
            reason: e.to_string(),
        })
    }

    /// Wire name of this command
    pub fn kind(&self) -> &'static str {
        match self {
            HostCommand::AuthToken { .. } => AUTH_TOKEN,
            HostCommand::OpenDoc { .. } => OPEN_DOC,
            HostCommand::SetMode { .. } => SET_MODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_auth_token() {
        let command = HostCommand::from_message(&json!({ "type": "AUTH_TOKEN", "token": "t1" }));
        assert_eq!(
            command,
            Ok(HostCommand::AuthToken {
                token: "t1".to_string()
            })
        );
    }

    #[test]
    fn test_decode_open_doc_uses_camel_case_id() {
        let command = HostCommand::from_message(&json!({ "type": "OPEN_DOC", "docId": "doc1" }));
        assert_eq!(
            command,
            Ok(HostCommand::OpenDoc {
                doc_id: "doc1".to_string()
            })
        );

        let snake = HostCommand::from_message(&json!({ "type": "OPEN_DOC", "doc_id": "doc1" }));
        assert!(matches!(snake, Err(Rejection::InvalidPayload { .. })));
    }

    #[test]
    fn test_decode_set_mode() {
        let command = HostCommand::from_message(&json!({ "type": "SET_MODE", "mode": "view" }));
        assert_eq!(
            command,
            Ok(HostCommand::SetMode {
                mode: EditMode::View
            })
        );
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        let command = HostCommand::from_message(&json!({
            "type": "SET_MODE",
            "mode": "comment",
            "source": "react-devtools"
        }));
        assert!(command.is_ok());
    }

    #[test]
    fn test_non_objects_are_rejected() {
        assert_eq!(
            HostCommand::from_message(&json!("OPEN_DOC")),
            Err(Rejection::NotAnObject)
        );
        assert_eq!(
            HostCommand::from_message(&json!(null)),
            Err(Rejection::NotAnObject)
        );
        assert_eq!(
            HostCommand::from_message(&json!([{ "type": "READY" }])),
            Err(Rejection::NotAnObject)
        );
    }

    #[test]
    fn test_missing_or_non_string_type() {
        assert_eq!(
            HostCommand::from_message(&json!({ "docId": "doc1" })),
            Err(Rejection::MissingType)
        );
        assert_eq!(
            HostCommand::from_message(&json!({ "type": 7 })),
            Err(Rejection::MissingType)
        );
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            HostCommand::from_message(&json!({ "type": "PING" })),
            Err(Rejection::UnknownType("PING".to_string()))
        );
    }

    #[test]
    fn test_bad_payloads() {
        let bad_mode = HostCommand::from_message(&json!({ "type": "SET_MODE", "mode": "admin" }));
        assert!(matches!(bad_mode, Err(Rejection::InvalidPayload { ref kind, .. }) if kind == "SET_MODE"));

        let no_token = HostCommand::from_message(&json!({ "type": "AUTH_TOKEN" }));
        assert!(matches!(no_token, Err(Rejection::InvalidPayload { .. })));

        let numeric_id = HostCommand::from_message(&json!({ "type": "OPEN_DOC", "docId": 42 }));
        assert!(matches!(numeric_id, Err(Rejection::InvalidPayload { .. })));
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let command = HostCommand::SetMode {
            mode: EditMode::Edit,
        };
        let wire = serde_json::to_value(&command).unwrap();
        assert_eq!(wire["type"], command.kind());
    }
}
