use async_trait::async_trait;

use crate::domain::bundle::PngImage;
use crate::error::AppResult;
use crate::page::{PageHandle, PageSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// A tab as the privileged host sees it.
#[derive(Debug, Clone)]
pub struct TabInfo {
    pub id: TabId,
    pub window: WindowId,
    pub url: String,
    pub page: PageHandle,
}

/// The privileged browser surface: window focus, tab activation, and
/// visible-area capture. Only the background context talks to it.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    async fn open_tab(&self, snapshot: PageSnapshot) -> AppResult<TabInfo>;

    async fn focus_window(&self, window: WindowId) -> AppResult<()>;

    async fn activate_tab(&self, tab: TabId) -> AppResult<()>;

    /// Activation state of the tab, or `None` once the tab is gone.
    async fn tab_active(&self, tab: TabId) -> Option<bool>;

    /// Point-in-time PNG capture of the focused window's visible tab.
    async fn capture_visible(&self, window: WindowId) -> AppResult<PngImage>;
}

/// Rasterizes user markings into the screenshot before submission.
pub trait ScreenshotAnnotator: Send + Sync {
    fn annotate(&self, image: PngImage) -> PngImage;
}

/// Default annotator: the image goes up exactly as captured.
pub struct PassthroughAnnotator;

impl ScreenshotAnnotator for PassthroughAnnotator {
    fn annotate(&self, image: PngImage) -> PngImage {
        image
    }
}
