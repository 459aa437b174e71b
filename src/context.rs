use std::sync::Arc;

use crate::services::{BrowserHost, IssueTrackerService, ScreenshotAnnotator};
use crate::store::SessionStore;

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<SessionStore>,
    pub host: Arc<dyn BrowserHost>,
    pub tracker: Arc<dyn IssueTrackerService>,
    pub annotator: Arc<dyn ScreenshotAnnotator>,
}

impl AppContext {
    pub fn new(
        store: Arc<SessionStore>,
        host: Arc<dyn BrowserHost>,
        tracker: Arc<dyn IssueTrackerService>,
        annotator: Arc<dyn ScreenshotAnnotator>,
    ) -> Self {
        Self {
            store,
            host,
            tracker,
            annotator,
        }
    }
}
