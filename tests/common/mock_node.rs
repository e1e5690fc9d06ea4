// tests/common/mock_node.rs
//! Mock gossip node exposing `/events` and `/api/delta` over HTTP.

use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};

use deltabus_lib::bus::Envelope;

/// A mock node for testing.
pub struct MockNode {
    server: MockServer,
}

impl MockNode {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.base_url()
    }

    /// Serve `envelopes` as one finite SSE stream, framed the way the node
    /// frames them (`data: <json>\n\n`).
    pub fn publish(&self, envelopes: &[Envelope]) -> Mock<'_> {
        let body: String = envelopes
            .iter()
            .map(|envelope| {
                let json = serde_json::to_string(envelope).expect("envelope serializes");
                format!("data: {json}\n\n")
            })
            .collect();

        self.server.mock(|when, then| {
            when.method(GET).path("/events");
            then.status(200)
                .header("content-type", "text/event-stream")
                .header("cache-control", "no-cache")
                .body(body);
        })
    }

    /// Accept any delta submission and answer with `status` and `body`.
    pub fn accept_deltas(&self, status: u16, body: &str) -> Mock<'_> {
        let body = body.to_string();
        self.server.mock(|when, then| {
            when.method(POST).path("/api/delta");
            then.status(status).body(body);
        })
    }
}
