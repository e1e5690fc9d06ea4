//! In-memory event logs fed by the node's event stream.
//!
//! # Architecture
//!
//! Records flow from the stream subscriber → EventBus → observers:
//! - `EventBus`: owns the event log (last 1000 envelopes) and the delta log
//!   (last 500 delta payloads), and broadcasts each accepted envelope
//! - `BoundedLog`: the sliding window both logs are built on
//! - Observers either take a `LogSnapshot` or `subscribe()` to updates

mod envelope;
mod event_bus;
pub mod event_types;
mod ring;

pub use envelope::{DeltaChange, Envelope, ParticipantEvent};
pub use event_bus::{EventBus, LogSnapshot, StoreUpdate};
pub use ring::BoundedLog;
