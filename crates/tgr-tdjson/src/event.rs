use serde::de::DeserializeOwned;
use serde::Deserialize as _;
use serde_json::Value;

use tgr_core::{Error, Result};

/// Well-known `@type` discriminators this crate dispatches on.
pub mod class_types {
    pub const ERROR: &str = "error";
    pub const UPDATE_NEW_MESSAGE: &str = "updateNewMessage";
    pub const MESSAGE_TEXT: &str = "messageText";
}

/// One decoded message unit from the native endpoint: the `@type`
/// discriminator, the echoed correlation id (empty when absent), and the full
/// payload kept undecoded until a consumer picks its own shape.
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: String,
    pub extra: String,
    raw: Value,
}

impl Event {
    pub(crate) fn parse(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json).map_err(|e| Error::Parse {
            context: "malformed endpoint payload".to_string(),
            source: e,
        })?;
        let event_type = raw
            .get("@type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let extra = raw
            .get("@extra")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            event_type,
            extra,
            raw,
        })
    }

    pub fn is_error(&self) -> bool {
        self.event_type == class_types::ERROR
    }

    /// Decode the payload into a caller-chosen type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.raw).map_err(|e| Error::Parse {
            context: format!("decoding {} event", self.event_type),
            source: e,
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorPayload;

    #[test]
    fn parse_extracts_type_and_extra() {
        let ev = Event::parse(r#"{"@type":"ok","@extra":"7"}"#).unwrap();
        assert_eq!(ev.event_type, "ok");
        assert_eq!(ev.extra, "7");
    }

    #[test]
    fn extra_defaults_to_empty() {
        let ev = Event::parse(r#"{"@type":"updateNewMessage","message":{}}"#).unwrap();
        assert_eq!(ev.event_type, "updateNewMessage");
        assert!(ev.extra.is_empty());
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let err = Event::parse("definitely not json").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn decode_reads_the_whole_payload() {
        let ev = Event::parse(r#"{"@type":"error","code":420,"message":"FLOOD_WAIT"}"#).unwrap();
        assert!(ev.is_error());
        let payload: ErrorPayload = ev.decode().unwrap();
        assert_eq!(payload.code, 420);
        assert_eq!(payload.message, "FLOOD_WAIT");
    }
}
