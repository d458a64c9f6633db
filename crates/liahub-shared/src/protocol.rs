use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Events pushed by the server over the realtime socket.
///
/// The payload carries the raw message document; the bridge runs it through
/// the same ingestion mappers the HTTP fetch path uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A new chat message was delivered to one of the user's threads.
    #[serde(rename = "message:new")]
    MessageNew {
        #[serde(rename = "threadId")]
        thread_id: String,
        /// Raw message document, normalized by the bridge on ingestion.
        message: Value,
    },
}

impl ServerEvent {
    /// Serialize to the JSON text frame format the socket speaks.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a text frame.
    ///
    /// Frames naming an event this client does not subscribe to are reported
    /// as [`ProtocolError::UnknownEvent`] so the socket task can log and skip
    /// them without treating the connection as broken.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let tag = value
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value(value) {
            Ok(event) => Ok(event),
            Err(e) if tag.is_empty() || tag == "message:new" => Err(ProtocolError::Malformed(e)),
            Err(_) => Err(ProtocolError::UnknownEvent(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_roundtrip() {
        let event = ServerEvent::MessageNew {
            thread_id: "t1".into(),
            message: json!({"_id": "m1", "text": "hej"}),
        };

        let text = event.to_json().unwrap();
        let restored = ServerEvent::from_json(&text).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_unknown_event_is_reported_with_its_tag() {
        let frame = json!({"event": "presence:update", "data": {}}).to_string();
        match ServerEvent::from_json(&frame) {
            Err(ProtocolError::UnknownEvent(tag)) => assert_eq!(tag, "presence:update"),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_frame_is_malformed() {
        assert!(matches!(
            ServerEvent::from_json("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
