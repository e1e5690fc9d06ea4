use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::sse::{SseDecoder, SseEvent};
use crate::bus::EventBus;
use crate::config::{join_endpoint, BusConfig};
use crate::error::BusError;

const EVENTS_PATH: &str = "events";

/// Lifecycle of one event stream connection. There is no way back from
/// `Closed`; callers that want a new stream call `connect` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Opens `GET {base}/events` streams that feed an [`EventBus`].
pub struct StreamSubscriber {
    client: reqwest::Client,
    url: String,
    bus: Arc<EventBus>,
}

impl StreamSubscriber {
    pub fn new(config: &BusConfig, bus: Arc<EventBus>) -> Result<Self, BusError> {
        config.validate()?;
        Ok(Self {
            client: config.http_client()?,
            url: config.endpoint(EVENTS_PATH),
            bus,
        })
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, bus: Arc<EventBus>) -> Self {
        Self {
            client,
            url: join_endpoint(base_url, EVENTS_PATH),
            bus,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start streaming on a background task and return immediately.
    ///
    /// Must be called from within a tokio runtime. Transport failures and
    /// malformed records are logged, never returned; the stream is not
    /// re-established once it closes.
    pub fn connect(&self) -> ConnectionHandle {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let task = tokio::spawn(run_stream(
            self.client.clone(),
            self.url.clone(),
            self.bus.clone(),
            state_tx,
        ));

        ConnectionHandle {
            url: self.url.clone(),
            state: state_rx,
            task,
        }
    }
}

/// Convenience: connect `{base_url}/events` to `bus` with default settings.
pub fn connect_events(base_url: &str, bus: Arc<EventBus>) -> Result<ConnectionHandle, BusError> {
    let config = BusConfig::new(base_url);
    Ok(StreamSubscriber::new(&config, bus)?.connect())
}

/// Owned handle to a running stream. Dropping it closes the stream.
#[must_use = "dropping a ConnectionHandle closes the event stream"]
pub struct ConnectionHandle {
    url: String,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        if self.task.is_finished() {
            return ConnectionState::Closed;
        }
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Wait until the connection leaves `Connecting`, returning the state it
    /// moved to.
    pub async fn opened(&mut self) -> ConnectionState {
        let result = self
            .state
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map(|state| *state);
        result.unwrap_or(ConnectionState::Closed)
    }

    /// Wait until the server ends the stream or the transport fails.
    pub async fn closed(&mut self) {
        let _ = self
            .state
            .wait_for(|state| *state == ConnectionState::Closed)
            .await;
    }

    pub fn close(self) {
        debug!("closing event stream at {}", self.url);
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_stream(
    client: reqwest::Client,
    url: String,
    bus: Arc<EventBus>,
    state: watch::Sender<ConnectionState>,
) {
    match stream_events(&client, &url, &bus, &state).await {
        Ok(()) => info!("event stream at {url} ended"),
        Err(error) => warn!("event stream at {url} failed: {error}"),
    }
    state.send_replace(ConnectionState::Closed);
}

async fn stream_events(
    client: &reqwest::Client,
    url: &str,
    bus: &EventBus,
    state: &watch::Sender<ConnectionState>,
) -> Result<(), BusError> {
    let response = client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(|e| BusError::Transport(format!("failed to connect: {e}")))?;

    let status = response.status();
    debug!("event stream response: status={status}");
    if !status.is_success() {
        return Err(BusError::Transport(format!(
            "unexpected status {}",
            status.as_u16()
        )));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !is_event_stream(content_type) {
        return Err(BusError::Transport(format!(
            "unexpected content type '{content_type}'"
        )));
    }

    state.send_replace(ConnectionState::Open);
    info!("connected to event stream at {url}");

    let mut decoder = SseDecoder::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| BusError::Transport(format!("stream error: {e}")))?;
        trace!("received SSE chunk of {} bytes", bytes.len());
        for event in decoder.feed(&bytes) {
            deliver(bus, event);
        }
    }

    if decoder.has_pending() {
        debug!("discarding incomplete SSE event at end of stream");
    }
    Ok(())
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case("text/event-stream"))
        .unwrap_or(false)
}

/// Hand one decoded event to the bus. Only unnamed (`message`) events are
/// records; a record that fails to parse is dropped with a warning.
pub(crate) fn deliver(bus: &EventBus, event: SseEvent) {
    if event.event_type != "message" {
        debug!("skipping named SSE event '{}'", event.event_type);
        return;
    }
    if let Err(error) = bus.ingest(&event.data) {
        warn!("bad SSE payload: {error}");
    }
}
