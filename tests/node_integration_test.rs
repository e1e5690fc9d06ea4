// tests/node_integration_test.rs
//! End-to-end tests against a mock node through the public API only.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockNode;
use deltabus_lib::bus::event_types::{EVENT_DELTA_UPDATED, EVENT_PARTICIPANT_ADDED};
use deltabus_lib::bus::{DeltaChange, Envelope, ParticipantEvent};
use deltabus_lib::{BusConfig, ConnectionState, DeltaRequest, DeltaSender, EventBus, StreamSubscriber};
use serde_json::json;

fn node_stream() -> Vec<Envelope> {
    vec![
        Envelope::new(
            EVENT_PARTICIPANT_ADDED,
            json!({"node": "node-b", "time": "2024-01-01T00:00:00Z", "mv": 3}),
        ),
        Envelope::new(
            EVENT_DELTA_UPDATED,
            json!({
                "group": "config",
                "key": "color",
                "version": 2,
                "from": 1,
                "previous_value": "red",
                "value": "blue"
            }),
        ),
        Envelope::new("delta", json!({"group": "config", "key": "size", "value": "xl"})),
    ]
}

#[tokio::test]
async fn subscriber_and_sender_share_one_config() {
    let node = MockNode::start().await;
    let events = node.publish(&node_stream());
    let deltas = node.accept_deltas(200, r#"{"ok":true}"#);

    let mut config = BusConfig::new(node.base_url());
    config.event_capacity = 2;

    let bus = Arc::new(EventBus::from_config(&config));
    let subscriber = StreamSubscriber::new(&config, bus.clone()).expect("valid config");
    let mut handle = subscriber.connect();

    tokio::time::timeout(Duration::from_secs(10), handle.closed())
        .await
        .expect("finite stream closes");
    events.assert();
    assert_eq!(handle.state(), ConnectionState::Closed);

    let snapshot = bus.snapshot();
    assert_eq!(snapshot.events.len(), 2);
    assert_eq!(snapshot.dropped_events, 1);
    assert_eq!(snapshot.deltas, vec![json!({"group": "config", "key": "size", "value": "xl"})]);

    let change: DeltaChange = snapshot.events[0].payload_as().expect("delta_updated payload");
    assert_eq!(change.previous_value.as_deref(), Some("red"));

    let sender = DeltaSender::new(&config).expect("valid config");
    let response = sender
        .send(&DeltaRequest::new("green").with_group("config").with_key("color"))
        .await
        .expect("submission succeeds");
    deltas.assert();
    assert_eq!(response, json!({"ok": true}));
}

#[test]
fn typed_views_decode_node_payloads() {
    let stream = node_stream();
    let participant: ParticipantEvent = stream[0].payload_as().expect("participant payload");
    assert_eq!(participant.node, "node-b");
    assert_eq!(participant.mv, Some(3));
    assert!(!stream[1].is_delta());
    assert!(stream[2].is_delta());
}

#[tokio::test]
async fn rejected_submission_reports_status() {
    let node = MockNode::start().await;
    node.accept_deltas(503, "unavailable");

    let error = deltabus_lib::send_delta(&node.base_url(), &DeltaRequest::new("x"))
        .await
        .expect_err("503 must fail");
    assert_eq!(error.to_string(), "send delta failed: 503");
}
