use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::event_types::is_delta_tag;
use crate::error::BusError;

/// One tagged message from the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Parse one stream record. The record must be a JSON object with a
    /// string `type`; a missing `payload` becomes `null`.
    ///
    /// This is stricter than accepting any JSON: valid JSON without a string
    /// `type` (`5`, `{"payload":1}`) is rejected and never reaches the event
    /// log.
    pub fn parse(data: &str) -> Result<Self, BusError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn is_delta(&self) -> bool {
        is_delta_tag(&self.kind)
    }

    /// Decode the payload into one of the typed views below (or any other
    /// deserializable shape).
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        serde_json::from_value(self.payload.clone()).map_err(|error| {
            BusError::Parse(format!("payload of '{}' envelope: {error}", self.kind))
        })
    }
}

/// Payload of `delta_added` / `delta_updated` envelopes. Only `delta_updated`
/// carries the version and previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaChange {
    pub group: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub previous_value: Option<String>,
}

/// Payload of `participant_added` / `participant_dead` envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEvent {
    pub node: String,
    #[serde(default)]
    pub time: Option<serde_json::Value>,
    /// Highest delta version the participant advertised when joining.
    #[serde(default)]
    pub mv: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_type_and_payload() {
        let envelope = Envelope::parse(r#"{"type":"delta","payload":{"v":1}}"#).unwrap();
        assert_eq!(envelope, Envelope::new("delta", json!({"v": 1})));
        assert!(envelope.is_delta());
    }

    #[test]
    fn missing_payload_is_null() {
        let envelope = Envelope::parse(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(envelope.payload, serde_json::Value::Null);
        assert!(!envelope.is_delta());
    }

    #[test]
    fn rejects_non_json_and_untagged_records() {
        assert!(matches!(Envelope::parse("not json"), Err(BusError::Parse(_))));
        assert!(matches!(Envelope::parse(r#"{"payload":1}"#), Err(BusError::Parse(_))));
        assert!(matches!(Envelope::parse(r#"{"type":7}"#), Err(BusError::Parse(_))));
        assert!(matches!(Envelope::parse("[1,2]"), Err(BusError::Parse(_))));
        assert!(matches!(Envelope::parse("5"), Err(BusError::Parse(_))));
    }

    #[test]
    fn serializes_kind_as_type() {
        let raw = serde_json::to_value(Envelope::new("delta_update", json!("x"))).unwrap();
        assert_eq!(raw, json!({"type": "delta_update", "payload": "x"}));
    }

    #[test]
    fn decodes_node_payload_views() {
        let updated = Envelope::new(
            "delta_updated",
            json!({
                "group": "config",
                "key": "color",
                "version": 7,
                "from": 6,
                "previous_value": "red",
                "value": "blue"
            }),
        );
        let change: DeltaChange = updated.payload_as().unwrap();
        assert_eq!(change.value, "blue");
        assert_eq!(change.previous_value.as_deref(), Some("red"));
        assert_eq!(change.version, Some(7));

        let added = Envelope::new(
            "delta_added",
            json!({"group": "config", "key": "size", "value": "xl"}),
        );
        let change: DeltaChange = added.payload_as().unwrap();
        assert_eq!(change.version, None);

        let dead = Envelope::new(
            "participant_dead",
            json!({"node": "node-b", "time": "2024-01-01T00:00:00Z", "address": "127.0.0.1:8082"}),
        );
        let participant: ParticipantEvent = dead.payload_as().unwrap();
        assert_eq!(participant.node, "node-b");
        assert_eq!(participant.address.as_deref(), Some("127.0.0.1:8082"));

        assert!(dead.payload_as::<DeltaChange>().is_err());
    }
}
