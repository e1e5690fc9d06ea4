//! Client-side event bus for delta gossip nodes.
//!
//! A node exposes two HTTP endpoints: a Server-Sent Events stream at
//! `/events` and a submission endpoint at `/api/delta`. This crate:
//! - Subscribes to the stream and keeps the most recent envelopes in bounded
//!   in-memory logs that any number of readers can snapshot or subscribe to
//! - Submits single delta updates back to the node
//!
//! # Architecture
//!
//! - `bus`: `EventBus` owning the event log and delta log
//! - `stream`: SSE decoding and the background stream subscriber
//! - `api`: the delta submission client
//! - `config`: client configuration and env overrides
//! - `error`: shared error type

pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod stream;

#[cfg(test)]
mod tests;

pub use api::{send_delta, DeltaRequest, DeltaSender};
pub use bus::{Envelope, EventBus, LogSnapshot, StoreUpdate};
pub use config::BusConfig;
pub use error::BusError;
pub use stream::{connect_events, ConnectionHandle, ConnectionState, StreamSubscriber};

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the process-wide `tracing` subscriber. Logs go to stderr so that
/// stdout stays free for machine-readable output. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("deltabus=info,deltabus_lib=info,warn")
                }),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
