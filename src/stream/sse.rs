//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers until a full line is
//! available so that lines (and multi-byte characters) split across chunks
//! decode correctly.

use tracing::{trace, warn};

const DEFAULT_EVENT_TYPE: &str = "message";
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (`message` unless the server set `event:`).
    pub event_type: String,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last event id seen on the stream at dispatch time.
    pub id: Option<String>,
    /// Reconnection hint from the server, in milliseconds.
    pub retry: Option<u64>,
}

#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
    max_line_bytes: usize,
    /// Set while skipping the rest of an oversized line.
    discarding_line: bool,
    data: String,
    event_type: String,
    last_event_id: Option<String>,
    retry: Option<u64>,
    seen_first_line: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines longer than `max_line_bytes` are dropped along with the event
    /// they belong to.
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line_bytes,
            discarding_line: false,
            data: String::new(),
            event_type: String::new(),
            last_event_id: None,
            retry: None,
            seen_first_line: false,
        }
    }

    /// Feed a chunk and return every event it completed, in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline_idx) = self.next_newline() {
            let mut line: Vec<u8> = self.buffer.drain(..=newline_idx).collect();
            if self.discarding_line {
                self.discarding_line = false;
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let text = String::from_utf8_lossy(&line);
            let text = if self.seen_first_line {
                &*text
            } else {
                self.seen_first_line = true;
                text.strip_prefix('\u{feff}').unwrap_or(&*text)
            };

            if let Some(event) = self.process_line(text) {
                events.push(event);
            }
        }

        if self.buffer.len() > self.max_line_bytes {
            warn!(
                "dropping SSE line longer than {} bytes and its pending event",
                self.max_line_bytes
            );
            self.buffer.clear();
            self.scanned = 0;
            self.discarding_line = true;
            self.seen_first_line = true;
            self.data.clear();
            self.event_type.clear();
        }
        events
    }

    fn next_newline(&mut self) -> Option<usize> {
        match self.buffer[self.scanned..].iter().position(|byte| *byte == b'\n') {
            Some(offset) => {
                let idx = self.scanned + offset;
                self.scanned = 0;
                Some(idx)
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// True if a partial line or an undispatched event is buffered.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || !self.data.is_empty()
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn retry(&self) -> Option<u64> {
        self.retry
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = value.to_string(),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit()) {
                    self.retry = value.parse().ok();
                }
            }
            _ => trace!("unknown SSE field: {field}"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }

        Some(SseEvent {
            event_type: if event_type.is_empty() {
                DEFAULT_EVENT_TYPE.to_string()
            } else {
                event_type
            },
            data,
            id: self.last_event_id.clone(),
            retry: self.retry,
        })
    }
}
