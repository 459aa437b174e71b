use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, warn};

use crate::domain::bundle::{LogEntry, LogLevel};

/// Where intercepted console calls are forwarded after being buffered.
/// The recorder observes; it never suppresses the original call.
pub trait ConsoleSink: Send + Sync {
    fn write(&self, level: LogLevel, args: &[serde_json::Value]);
}

/// Forwards page console output to the process log.
pub struct TracingSink;

impl ConsoleSink for TracingSink {
    fn write(&self, level: LogLevel, args: &[serde_json::Value]) {
        let line = args
            .iter()
            .map(|value| match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        match level {
            LogLevel::Log => debug!(target: "page_console", "{line}"),
            LogLevel::Info => info!(target: "page_console", "{line}"),
            LogLevel::Warn => warn!(target: "page_console", "{line}"),
            LogLevel::Error => error!(target: "page_console", "{line}"),
        }
    }
}

/// Buffers every console call made during one page load. A fresh recorder
/// is installed per load, so the buffer never survives a navigation.
/// No size bound is enforced.
pub struct LogRecorder {
    sink: Arc<dyn ConsoleSink>,
    entries: Vec<LogEntry>,
}

impl LogRecorder {
    pub fn new(sink: Arc<dyn ConsoleSink>) -> Self {
        Self {
            sink,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, level: LogLevel, args: Vec<serde_json::Value>) {
        self.entries.push(LogEntry {
            level,
            args: args.clone(),
            timestamp: now_ms(),
        });
        self.sink.write(level, &args);
    }

    /// The full buffered sequence. Reading never clears the buffer, so
    /// repeated queries return the same entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
