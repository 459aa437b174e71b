use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::bus::{request, Outcome};
use crate::domain::schema::FieldSchema;
use crate::error::AppResult;
use crate::services::{BrowserHost, IssueTrackerService, TabInfo};
use crate::store::SessionStore;
use crate::workflow::capture::{CaptureOrchestrator, OpenComposer};

/// Requests served by the background context. Captures and schema loads
/// both run here: captures need the privileged host, and schema loads need
/// network access the composer context does not have.
pub enum BackgroundRequest {
    Capture {
        tab: TabInfo,
        reply: oneshot::Sender<AppResult<()>>,
    },
    LoadSchema {
        reply: oneshot::Sender<Result<FieldSchema, String>>,
    },
}

#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::Sender<BackgroundRequest>,
}

impl BackgroundHandle {
    pub async fn capture(&self, tab: TabInfo) -> Outcome<AppResult<()>> {
        request(&self.tx, |reply| BackgroundRequest::Capture { tab, reply }).await
    }

    /// The schema, or a descriptive error string; the failure is a value so
    /// the composer can render a degraded form instead of crashing.
    pub async fn load_schema(&self) -> Outcome<Result<FieldSchema, String>> {
        request(&self.tx, |reply| BackgroundRequest::LoadSchema { reply }).await
    }
}

/// Spawns the background task. Returns its address plus the receiver the
/// composer view waits on for its open signal.
pub fn spawn(
    host: Arc<dyn BrowserHost>,
    store: Arc<SessionStore>,
    tracker: Arc<dyn IssueTrackerService>,
) -> (BackgroundHandle, mpsc::Receiver<OpenComposer>) {
    let (composer_tx, composer_rx) = mpsc::channel(1);
    let orchestrator = CaptureOrchestrator::new(host, store.clone(), composer_tx);
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(run(orchestrator, store, tracker, rx));
    (BackgroundHandle { tx }, composer_rx)
}

async fn run(
    orchestrator: CaptureOrchestrator,
    store: Arc<SessionStore>,
    tracker: Arc<dyn IssueTrackerService>,
    mut rx: mpsc::Receiver<BackgroundRequest>,
) {
    debug!("background context started");
    while let Some(req) = rx.recv().await {
        match req {
            BackgroundRequest::Capture { tab, reply } => {
                let _ = reply.send(orchestrator.capture(&tab).await);
            }
            BackgroundRequest::LoadSchema { reply } => {
                debug!("schema load requested");
                let settings = store.settings();
                let result = tracker
                    .fetch_create_meta(&settings)
                    .await
                    .map_err(|err| err.to_string());
                let _ = reply.send(result);
            }
        }
    }
    debug!("background context stopped");
}
