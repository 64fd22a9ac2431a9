use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_EVENT: &str = "message";

/// A parsed Server-Sent Event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Event name, `"message"` when the stream did not name it
    pub event: String,
    /// Event payload: decoded JSON when the data parses, the raw text otherwise
    pub data: Value,
    /// Last `id:` seen for this event
    pub id: Option<String>,
}

/// Events received over one streamed response, grouped by event name.
///
/// Within each name the events keep their arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventAggregate {
    events: BTreeMap<String, Vec<SseEvent>>,
}

impl EventAggregate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SseEvent) {
        self.events.entry(event.event.clone()).or_default().push(event);
    }

    /// Events received under `name`, in arrival order
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[SseEvent]> {
        self.events.get(name).map(Vec::as_slice)
    }

    /// Number of distinct event names
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events across all names
    #[must_use]
    pub fn total(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SseEvent])> {
        self.events
            .iter()
            .map(|(name, events)| (name.as_str(), events.as_slice()))
    }
}

/// Receives each event as soon as it has been decoded.
///
/// Called synchronously on the task that reads the response body, so a slow
/// listener stalls consumption of further chunks.
pub trait EventListener {
    fn on_event(&mut self, event: &SseEvent);
}

impl<F> EventListener for F
where
    F: FnMut(&SseEvent),
{
    fn on_event(&mut self, event: &SseEvent) {
        self(event);
    }
}

#[derive(Debug, Default)]
struct PendingEvent {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl PendingEvent {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty() && self.id.is_none()
    }

    fn take(&mut self) -> Option<SseEvent> {
        if self.is_empty() {
            return None;
        }
        let PendingEvent { event, data, id } = std::mem::take(self);

        let joined = data.join("\n");
        let data = match serde_json::from_str(&joined) {
            Ok(value) => value,
            Err(_) => Value::String(joined),
        };

        Some(SseEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_owned()),
            data,
            id,
        })
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines or events at any byte; incomplete lines are held
/// until the rest arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    // Leading bytes of `buffer` already known to hold no line break
    scanned: usize,
    pending: PendingEvent,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, emitting every event it completes.
    pub fn feed(&mut self, chunk: &[u8], emit: &mut dyn FnMut(SseEvent)) {
        self.buffer.extend_from_slice(chunk);

        let buffer = std::mem::take(&mut self.buffer);
        let mut consumed = 0;
        let mut scan_from = self.scanned;
        while let Some(offset) = buffer[scan_from..].iter().position(|&b| b == b'\n') {
            let end = scan_from + offset;
            self.process_line(trim_line_ending(&buffer[consumed..=end]), emit);
            consumed = end + 1;
            scan_from = consumed;
        }

        self.buffer = buffer;
        self.buffer.drain(..consumed);
        self.scanned = self.buffer.len();
    }

    /// Flush state at end of stream.
    ///
    /// A trailing line without a newline and an event without a closing blank
    /// line are both still emitted.
    pub fn finish(&mut self, emit: &mut dyn FnMut(SseEvent)) {
        self.scanned = 0;
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(trim_line_ending(&line), emit);
        }
        self.dispatch(emit);
    }

    fn process_line(&mut self, line: &[u8], emit: &mut dyn FnMut(SseEvent)) {
        if line.is_empty() {
            self.dispatch(emit);
            return;
        }
        if line.starts_with(b":") {
            return;
        }

        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "event" => self.pending.event = Some(value.to_owned()),
            "data" => self.pending.data.push(value.to_owned()),
            "id" => self.pending.id = Some(value.to_owned()),
            _ => tracing::trace!(field, "ignoring unknown SSE field"),
        }
    }

    fn dispatch(&mut self, emit: &mut dyn FnMut(SseEvent)) {
        if let Some(event) = self.pending.take() {
            tracing::trace!(event = %event.event, id = ?event.id, "dispatching SSE event");
            emit(event);
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Decoder state for one response: forwards every event to the listener and
/// then records it in the aggregate.
pub struct EventCollector<'a> {
    decoder: SseDecoder,
    aggregate: EventAggregate,
    listener: Option<&'a mut (dyn EventListener + Send)>,
}

impl<'a> EventCollector<'a> {
    pub(crate) fn new(listener: Option<&'a mut (dyn EventListener + Send)>) -> Self {
        Self {
            decoder: SseDecoder::new(),
            aggregate: EventAggregate::new(),
            listener,
        }
    }

    pub(crate) fn feed(&mut self, chunk: &[u8]) {
        let Self {
            decoder,
            aggregate,
            listener,
        } = self;
        decoder.feed(chunk, &mut |event| deliver(listener, aggregate, event));
    }

    pub(crate) fn finish(mut self) -> EventAggregate {
        let Self {
            decoder,
            aggregate,
            listener,
        } = &mut self;
        decoder.finish(&mut |event| deliver(listener, aggregate, event));
        self.aggregate
    }

    /// Events completed so far, without flushing any partial event.
    pub(crate) fn into_partial(self) -> EventAggregate {
        self.aggregate
    }
}

fn deliver(
    listener: &mut Option<&mut (dyn EventListener + Send)>,
    aggregate: &mut EventAggregate,
    event: SseEvent,
) {
    if let Some(listener) = listener.as_mut() {
        listener.on_event(&event);
    }
    aggregate.push(event);
}
