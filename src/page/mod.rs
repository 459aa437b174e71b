pub mod probe;
pub mod recorder;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::bus::{request, Outcome};
use crate::domain::bundle::{LogEntry, LogLevel, PngImage, Versions};
use crate::page::probe::{probe_versions, ProbeConfig, StaticDom};
use crate::page::recorder::{ConsoleSink, LogRecorder};

/// Everything a page context needs for one load.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub dom: StaticDom,
    /// The page's current visible content, PNG-encoded.
    pub viewport: PngImage,
}

/// Requests served by a page context.
pub enum PageRequest {
    /// The full buffered console sequence; reading does not clear it.
    ConsoleLogs { reply: oneshot::Sender<Vec<LogEntry>> },
    /// Scrape version markers from the page's element snapshot.
    Versions {
        config: ProbeConfig,
        reply: oneshot::Sender<Versions>,
    },
    /// Render the visible area as PNG.
    Render { reply: oneshot::Sender<PngImage> },
    /// Console traffic from the page's own scripts.
    Console {
        level: LogLevel,
        args: Vec<serde_json::Value>,
    },
    /// Replace the loaded page; reinstalls the log recorder.
    Navigate { snapshot: PageSnapshot },
    /// Stop the page task. Pending handles observe a closed channel.
    Close,
}

/// Cloneable address of a page context. Every operation degrades to
/// [`Outcome::NoResponder`] once the page task has stopped.
#[derive(Debug, Clone)]
pub struct PageHandle {
    tx: mpsc::Sender<PageRequest>,
}

impl PageHandle {
    pub async fn console_logs(&self) -> Outcome<Vec<LogEntry>> {
        request(&self.tx, |reply| PageRequest::ConsoleLogs { reply }).await
    }

    pub async fn versions(&self, config: ProbeConfig) -> Outcome<Versions> {
        request(&self.tx, |reply| PageRequest::Versions { config, reply }).await
    }

    pub async fn render(&self) -> Outcome<PngImage> {
        request(&self.tx, |reply| PageRequest::Render { reply }).await
    }

    pub async fn console(&self, level: LogLevel, args: Vec<serde_json::Value>) {
        let _ = self.tx.send(PageRequest::Console { level, args }).await;
    }

    pub async fn navigate(&self, snapshot: PageSnapshot) {
        let _ = self.tx.send(PageRequest::Navigate { snapshot }).await;
    }

    pub async fn close(&self) {
        let _ = self.tx.send(PageRequest::Close).await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct PageContext {
    snapshot: PageSnapshot,
    recorder: LogRecorder,
    sink: Arc<dyn ConsoleSink>,
}

/// Spawns the page-side task and returns its address. The recorder is
/// installed before the handle is handed out, so no console call can be
/// missed.
pub fn spawn(snapshot: PageSnapshot, sink: Arc<dyn ConsoleSink>) -> PageHandle {
    let (tx, rx) = mpsc::channel(32);
    let context = PageContext {
        recorder: LogRecorder::new(sink.clone()),
        snapshot,
        sink,
    };
    tokio::spawn(run(context, rx));
    PageHandle { tx }
}

async fn run(mut ctx: PageContext, mut rx: mpsc::Receiver<PageRequest>) {
    debug!(url = %ctx.snapshot.url, "page context loaded");
    while let Some(req) = rx.recv().await {
        match req {
            PageRequest::ConsoleLogs { reply } => {
                let _ = reply.send(ctx.recorder.entries());
            }
            PageRequest::Versions { config, reply } => {
                let _ = reply.send(probe_versions(&ctx.snapshot.dom, &config));
            }
            PageRequest::Render { reply } => {
                let _ = reply.send(ctx.snapshot.viewport.clone());
            }
            PageRequest::Console { level, args } => {
                ctx.recorder.record(level, args);
            }
            PageRequest::Navigate { snapshot } => {
                debug!(url = %snapshot.url, "page navigated; reinstalling recorder");
                ctx.snapshot = snapshot;
                ctx.recorder = LogRecorder::new(ctx.sink.clone());
            }
            PageRequest::Close => break,
        }
    }
    debug!(url = %ctx.snapshot.url, "page context stopped");
}
