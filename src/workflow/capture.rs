use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::bus::Outcome;
use crate::domain::bundle::{CaptureBundle, LogEntry, PngImage};
use crate::error::{AppError, AppResult};
use crate::services::{BrowserHost, TabInfo};
use crate::store::SessionStore;

const ACTIVATION_POLL_INTERVAL: Duration = Duration::from_millis(50);
const ACTIVATION_POLL_ATTEMPTS: u32 = 40;

/// Sent to whoever renders the composer view once a bundle is persisted.
pub struct OpenComposer;

/// Progress of one capture invocation. Later phases carry the data the
/// earlier ones produced.
enum CapturePhase {
    Focusing,
    Activating,
    WaitingActive,
    Capturing,
    AwaitingLogs { screenshot: PngImage },
    Persisting {
        screenshot: PngImage,
        log_entries: Vec<LogEntry>,
    },
    Done,
}

impl CapturePhase {
    fn name(&self) -> &'static str {
        match self {
            CapturePhase::Focusing => "focusing",
            CapturePhase::Activating => "activating",
            CapturePhase::WaitingActive => "waiting-active",
            CapturePhase::Capturing => "capturing",
            CapturePhase::AwaitingLogs { .. } => "awaiting-logs",
            CapturePhase::Persisting { .. } => "persisting",
            CapturePhase::Done => "done",
        }
    }
}

/// Runs one capture cycle: focus and activate the target tab, take a
/// visible-area screenshot, collect the page's buffered console logs,
/// persist the bundle, and signal the composer view to open.
///
/// Focus and activation failures are tolerated: the screenshot can still
/// succeed against an already-visible tab. A screenshot failure aborts the
/// whole capture with no stored bundle.
pub struct CaptureOrchestrator {
    host: Arc<dyn BrowserHost>,
    store: Arc<SessionStore>,
    composer_tx: mpsc::Sender<OpenComposer>,
}

impl CaptureOrchestrator {
    pub fn new(
        host: Arc<dyn BrowserHost>,
        store: Arc<SessionStore>,
        composer_tx: mpsc::Sender<OpenComposer>,
    ) -> Self {
        Self {
            host,
            store,
            composer_tx,
        }
    }

    pub async fn capture(&self, tab: &TabInfo) -> AppResult<()> {
        info!(tab = tab.id.0, url = %tab.url, "capture requested");
        let mut phase = CapturePhase::Focusing;

        loop {
            debug!(phase = phase.name(), "capture phase");
            phase = match phase {
                CapturePhase::Focusing => {
                    if let Err(err) = self.host.focus_window(tab.window).await {
                        warn!("could not focus window {}: {err}", tab.window.0);
                    }
                    CapturePhase::Activating
                }
                CapturePhase::Activating => match self.host.activate_tab(tab.id).await {
                    Ok(()) => CapturePhase::WaitingActive,
                    Err(err) => {
                        warn!("could not activate tab, attempting capture anyway: {err}");
                        CapturePhase::Capturing
                    }
                },
                CapturePhase::WaitingActive => {
                    self.wait_for_activation(tab).await?;
                    CapturePhase::Capturing
                }
                CapturePhase::Capturing => {
                    let screenshot = self.host.capture_visible(tab.window).await?;
                    debug!(bytes = screenshot.len(), "screenshot captured");
                    CapturePhase::AwaitingLogs { screenshot }
                }
                CapturePhase::AwaitingLogs { screenshot } => {
                    let log_entries = match tab.page.console_logs().await {
                        Outcome::Answered(entries) => entries,
                        Outcome::NoResponder => {
                            warn!("no console recorder responded; defaulting to empty logs");
                            Vec::new()
                        }
                    };
                    CapturePhase::Persisting {
                        screenshot,
                        log_entries,
                    }
                }
                CapturePhase::Persisting {
                    screenshot,
                    log_entries,
                } => {
                    let bundle = CaptureBundle {
                        source_url: tab.url.clone(),
                        screenshot,
                        log_entries,
                        source_tab: tab.page.clone(),
                    };
                    self.store.put_bundle(bundle);
                    if self.composer_tx.send(OpenComposer).await.is_err() {
                        warn!("no composer view listening for the open signal");
                    }
                    CapturePhase::Done
                }
                CapturePhase::Done => {
                    info!(tab = tab.id.0, "capture complete");
                    return Ok(());
                }
            };
        }
    }

    /// Polls the tab's activation state at a fixed short interval. The
    /// poll is bounded: exhaustion and a vanished tab are both defined
    /// failures rather than an open-ended wait.
    async fn wait_for_activation(&self, tab: &TabInfo) -> AppResult<()> {
        for attempt in 1..=ACTIVATION_POLL_ATTEMPTS {
            match self.host.tab_active(tab.id).await {
                None => {
                    return Err(AppError::Capture(
                        "capture aborted: target page closed".to_string(),
                    ));
                }
                Some(true) => {
                    debug!(attempt, "tab is active");
                    return Ok(());
                }
                Some(false) => sleep(ACTIVATION_POLL_INTERVAL).await,
            }
        }
        Err(AppError::Capture(
            "capture aborted: tab never became active".to_string(),
        ))
    }
}
