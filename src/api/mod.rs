//! Outbound calls to the node's HTTP API.

mod delta;

pub use delta::{send_delta, DeltaRequest, DeltaSender};
