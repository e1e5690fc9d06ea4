//! HTTP-level tests against a mock node.

use serde_json::json;



/// Frame each record as one SSE `message` event.
pub fn sse_body<S: AsRef<str>>(records: &[S]) -> String {
    records
        .iter()
        .map(|record| format!("data: {}\n\n", record.as_ref()))
        .collect()
}

/// A serialized envelope with a numbered payload.
pub fn envelope_record(kind: &str, n: usize) -> String {
    json!({"type": kind, "payload": {"n": n}}).to_string()
}
