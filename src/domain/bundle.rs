use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::PageHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Warn,
    Error,
    Info,
}

/// One intercepted console call. Insertion order is chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub args: Vec<serde_json::Value>,
    pub timestamp: u64,
}

impl LogEntry {
    /// Space-joined rendering of the call arguments, with strings kept bare.
    pub fn render_args(&self) -> String {
        self.args
            .iter()
            .map(|value| match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Opaque PNG-encoded image.
#[derive(Clone, PartialEq, Eq)]
pub struct PngImage(Vec<u8>);

// 1x1 transparent PNG.
const BLANK_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

impl PngImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn blank() -> Self {
        Self(BLANK_PNG.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PngImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PngImage({} bytes)", self.0.len())
    }
}

/// Front-end and back-end version markers scraped from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions {
    pub fe_version: String,
    pub be_version: String,
}

/// Everything captured from one page for one bug-report cycle. A single
/// bundle exists system-wide; every capture replaces the previous one.
#[derive(Debug, Clone)]
pub struct CaptureBundle {
    pub source_url: String,
    pub screenshot: PngImage,
    pub log_entries: Vec<LogEntry>,
    /// Handle back to the originating page, used only to re-query it later.
    /// Not valid once the page task has stopped.
    pub source_tab: PageHandle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_args_space_joined() {
        let entry = LogEntry {
            level: LogLevel::Error,
            args: vec![json!("boom"), json!(42), json!({"a": 1})],
            timestamp: 1000,
        };
        assert_eq!(entry.render_args(), "boom 42 {\"a\":1}");
    }

    #[test]
    fn level_serde_is_lowercase() {
        let level: LogLevel = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(level, LogLevel::Warn);
        assert_eq!(serde_json::to_string(&LogLevel::Log).unwrap(), "\"log\"");
    }

    #[test]
    fn blank_png_has_signature() {
        let image = PngImage::blank();
        assert_eq!(&image.as_bytes()[..4], &[0x89, b'P', b'N', b'G']);
    }
}
