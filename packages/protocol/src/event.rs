//! Outbound notifications to the host
//!
//! Fire-and-forget: the host never acknowledges an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status and error notifications posted to the host page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostEvent {
    /// Inbound listener attached
    Ready,

    /// A load found no authenticated session
    NeedAuth,

    /// A submitted token was accepted
    AuthOk,

    /// A document finished loading
    DocLoaded {
        title: String,
        #[serde(rename = "lastSavedAt", with = "timestamp::option", default)]
        last_saved_at: Option<DateTime<Utc>>,
    },

    /// An edit was observed and a save is pending
    DocDirty,

    /// A debounced write completed
    DocSaved {
        #[serde(rename = "lastSavedAt", with = "timestamp")]
        last_saved_at: DateTime<Utc>,
    },

    /// A load, save, rename or auth failure
    Error { message: String },
}

impl HostEvent {
    pub fn error(message: impl Into<String>) -> Self {
        HostEvent::Error {
            message: message.into(),
        }
    }

    /// Wire name of this event
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::Ready => "READY",
            HostEvent::NeedAuth => "NEED_AUTH",
            HostEvent::AuthOk => "AUTH_OK",
            HostEvent::DocLoaded { .. } => "DOC_LOADED",
            HostEvent::DocDirty => "DOC_DIRTY",
            HostEvent::DocSaved { .. } => "DOC_SAVED",
            HostEvent::Error { .. } => "ERROR",
        }
    }
}

/// Timestamps travel as RFC 3339 UTC strings with millisecond precision,
/// e.g. `2024-05-01T12:30:00.250Z`.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => serializer.serialize_str(&format(at)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw).map(Some).map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap() + chrono::Duration::milliseconds(250)
    }

    #[test]
    fn test_unit_events_are_bare_envelopes() {
        assert_eq!(serde_json::to_value(HostEvent::Ready).unwrap(), json!({ "type": "READY" }));
        assert_eq!(serde_json::to_value(HostEvent::NeedAuth).unwrap(), json!({ "type": "NEED_AUTH" }));
        assert_eq!(serde_json::to_value(HostEvent::AuthOk).unwrap(), json!({ "type": "AUTH_OK" }));
        assert_eq!(serde_json::to_value(HostEvent::DocDirty).unwrap(), json!({ "type": "DOC_DIRTY" }));
    }

    #[test]
    fn test_doc_loaded_shape() {
        let loaded = HostEvent::DocLoaded {
            title: "Song".to_string(),
            last_saved_at: Some(at()),
        };
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            json!({ "type": "DOC_LOADED", "title": "Song", "lastSavedAt": "2024-05-01T12:30:00.250Z" })
        );
    }

    #[test]
    fn test_never_saved_serializes_null() {
        let loaded = HostEvent::DocLoaded {
            title: "Untitled".to_string(),
            last_saved_at: None,
        };
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            json!({ "type": "DOC_LOADED", "title": "Untitled", "lastSavedAt": null })
        );
    }

    #[test]
    fn test_doc_saved_and_error_shape() {
        let saved = HostEvent::DocSaved { last_saved_at: at() };
        assert_eq!(
            serde_json::to_value(&saved).unwrap(),
            json!({ "type": "DOC_SAVED", "lastSavedAt": "2024-05-01T12:30:00.250Z" })
        );
        assert_eq!(
            serde_json::to_value(HostEvent::error("boom")).unwrap(),
            json!({ "type": "ERROR", "message": "boom" })
        );
    }

    #[test]
    fn test_events_parse_back_for_hosts() {
        let event: HostEvent =
            serde_json::from_value(json!({ "type": "DOC_LOADED", "title": "A", "lastSavedAt": null })).unwrap();
        assert_eq!(
            event,
            HostEvent::DocLoaded {
                title: "A".to_string(),
                last_saved_at: None
            }
        );

        let event: HostEvent = serde_json::from_value(
            json!({ "type": "DOC_SAVED", "lastSavedAt": "2024-05-01T14:30:00.250+02:00" }),
        )
        .unwrap();
        assert_eq!(event, HostEvent::DocSaved { last_saved_at: at() });
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let events = [
            HostEvent::Ready,
            HostEvent::NeedAuth,
            HostEvent::AuthOk,
            HostEvent::DocDirty,
            HostEvent::DocSaved { last_saved_at: at() },
            HostEvent::error("x"),
        ];
        for event in events {
            let wire = serde_json::to_value(&event).unwrap();
            assert_eq!(wire["type"], event.kind());
        }
    }
}
