//! Server-Sent Events subscription.
//!
//! - `sse`: incremental `text/event-stream` decoder
//! - `subscriber`: opens `{base}/events`, feeds decoded records into the
//!   [`EventBus`](crate::bus::EventBus), reports connection state

pub mod sse;
mod subscriber;

pub use sse::{SseDecoder, SseEvent};
pub use subscriber::{connect_events, ConnectionHandle, ConnectionState, StreamSubscriber};
