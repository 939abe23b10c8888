//! Server-push (SSE) subscription.
//!
//! Named events dispatch to registered handlers; payloads are JSON-parsed
//! with a fallback to the raw string. No reconnect or backoff — loss
//! handling belongs to the caller's error handler.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::client::Http;
use crate::error::HttpError;

type Handler = Arc<dyn Fn(Value) + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(HttpError) + Send + Sync>;

/// One parsed SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental frame parser. Feed it chunks as they arrive; complete
/// frames (terminated by a blank line) come back out.
#[derive(Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(&chunk.replace("\r\n", "\n"));
        let mut events = Vec::new();
        while let Some(split) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..split + 2).collect();
            if let Some(event) = parse_frame(frame.trim_end_matches('\n')) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = "message".to_string();
    let mut data_lines: Vec<&str> = Vec::new();
    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = value.to_string(),
            "data" => data_lines.push(value),
            // id/retry are connection bookkeeping; not surfaced.
            _ => {}
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(SseEvent { event, data: data_lines.join("\n") })
}

/// Cancellation handle for a standing subscription.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    pub fn cancel(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A standing subscription; `close()` releases the connection.
pub struct EventStream {
    cancel: CancelHandle,
    task: tokio::task::JoinHandle<()>,
}

impl EventStream {
    pub fn close(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

pub struct StreamBuilder {
    client: reqwest::Client,
    bare: reqwest::Client,
    url: String,
    credentials: bool,
    handlers: HashMap<String, Handler>,
    on_error: Option<ErrorHandler>,
}

impl Http {
    /// Start building a subscription to a server-push endpoint.
    pub fn stream(&self, path: &str) -> StreamBuilder {
        StreamBuilder {
            client: self.client_for(true).clone(),
            bare: self.client_for(false).clone(),
            url: self.resolve_url(path),
            credentials: true,
            handlers: HashMap::new(),
            on_error: None,
        }
    }
}

impl StreamBuilder {
    pub fn anonymous(mut self) -> Self {
        self.credentials = false;
        self
    }

    /// Register a handler for a named event.
    pub fn on(mut self, event: &str, handler: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.handlers.insert(event.to_string(), Arc::new(handler));
        self
    }

    /// Register a handler for the default (unnamed) message event.
    pub fn on_message(self, handler: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on("message", handler)
    }

    pub fn on_error(mut self, handler: impl Fn(HttpError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Open the connection and spawn the reader loop.
    pub fn open(self) -> EventStream {
        let StreamBuilder { client, bare, url, credentials, handlers, on_error } = self;
        let client = if credentials { client } else { bare };
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let report = |err: HttpError| {
                if let Some(handler) = &on_error {
                    handler(err);
                } else {
                    warn!("event stream error with no handler");
                }
            };
            let response = match client
                .get(&url)
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    report(err.into());
                    return;
                }
            };
            if !response.status().is_success() {
                let status = response.status().as_u16();
                report(HttpError::status(
                    status,
                    HashMap::new(),
                    None,
                    url.clone(),
                    "GET".to_string(),
                ));
                return;
            }
            debug!(%url, "event stream opened");
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!(%url, "event stream closed by caller");
                        break;
                    }
                    chunk = body.next() => match chunk {
                        Some(Ok(bytes)) => {
                            let text = String::from_utf8_lossy(&bytes);
                            for event in parser.push(&text) {
                                if let Some(handler) = handlers.get(&event.event) {
                                    let payload = serde_json::from_str(&event.data)
                                        .unwrap_or(Value::String(event.data.clone()));
                                    handler(payload);
                                }
                            }
                        }
                        Some(Err(err)) => {
                            report(err.into());
                            break;
                        }
                        None => {
                            debug!(%url, "event stream ended");
                            break;
                        }
                    }
                }
            }
        });
        EventStream { cancel: CancelHandle { tx: Some(stop_tx) }, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_emits_complete_frames_only() {
        let mut parser = SseParser::new();
        assert!(parser.push("data: par").is_empty());
        let events = parser.push("tial\n\ndata: next\n\n");
        assert_eq!(
            events,
            vec![
                SseEvent { event: "message".into(), data: "partial".into() },
                SseEvent { event: "message".into(), data: "next".into() },
            ]
        );
    }

    #[test]
    fn named_events_and_multiline_data() {
        let mut parser = SseParser::new();
        let events = parser.push("event: units.updated\ndata: {\"id\":\ndata: 1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "units.updated");
        assert_eq!(events[0].data, "{\"id\":\n1}");
    }

    #[test]
    fn comments_and_bookkeeping_fields_are_ignored() {
        let mut parser = SseParser::new();
        let events = parser.push(": keep-alive\nid: 42\nretry: 100\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
        // Frames with no data lines produce nothing.
        assert!(parser.push("event: ping\n\n").is_empty());
    }

    #[test]
    fn crlf_frames_are_normalized() {
        let mut parser = SseParser::new();
        let events = parser.push("data: a\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a");
    }
}
