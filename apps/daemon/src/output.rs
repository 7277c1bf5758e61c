//! Event bus that prints to stdout, one JSON object per line.

use std::io::Write;

use serde::Serialize;
use volume0_events::EventBus;

#[derive(Serialize)]
struct Line<'a> {
    topic: &'a str,
    payload: &'a serde_json::Value,
}

/// Writes `{"topic": ..., "payload": ...}` lines. Logs go to stderr, so
/// stdout carries nothing else.
#[derive(Debug, Default)]
pub struct StdoutEventBus;

impl StdoutEventBus {
    pub fn new() -> Self {
        Self
    }
}

pub fn render_line(topic: &str, payload: &serde_json::Value) -> serde_json::Result<String> {
    serde_json::to_string(&Line { topic, payload })
}

impl EventBus for StdoutEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        let line = match render_line(topic, &payload) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(topic, error = %e, "Failed to encode event");
                return;
            }
        };

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
            tracing::error!(topic, error = %e, "Failed to write event to stdout");
        }
    }
}
