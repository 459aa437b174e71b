use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::bundle::PngImage;
use crate::error::{AppError, AppResult};
use crate::page::recorder::{ConsoleSink, TracingSink};
use crate::page::{self, PageSnapshot};
use crate::services::{BrowserHost, TabId, TabInfo, WindowId};

struct TabEntry {
    info: TabInfo,
    active: bool,
}

/// In-process host: every tab is a page task, windows are plain groups.
/// Stands in for the privileged browser surface, which only ever reaches
/// a page through its channel.
pub struct LocalHost {
    tabs: RwLock<HashMap<TabId, TabEntry>>,
    focused: RwLock<Option<WindowId>>,
    next_id: AtomicU32,
    sink: Arc<dyn ConsoleSink>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self {
            tabs: RwLock::new(HashMap::new()),
            focused: RwLock::new(None),
            next_id: AtomicU32::new(1),
            sink: Arc::new(TracingSink),
        }
    }

    /// Stops the tab's page task and forgets it. Handles kept by callers
    /// observe a closed channel from here on.
    pub async fn close_tab(&self, tab: TabId) {
        let entry = self.tabs.write().remove(&tab);
        if let Some(entry) = entry {
            entry.info.page.close().await;
            debug!(tab = tab.0, "tab closed");
        }
    }
}

#[async_trait]
impl BrowserHost for LocalHost {
    async fn open_tab(&self, snapshot: PageSnapshot) -> AppResult<TabInfo> {
        let id = TabId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let window = WindowId(id.0);
        let url = snapshot.url.clone();
        let page = page::spawn(snapshot, self.sink.clone());
        let info = TabInfo {
            id,
            window,
            url,
            page,
        };
        self.tabs.write().insert(
            id,
            TabEntry {
                info: info.clone(),
                active: false,
            },
        );
        debug!(tab = id.0, url = %info.url, "tab opened");
        Ok(info)
    }

    async fn focus_window(&self, window: WindowId) -> AppResult<()> {
        let known = self
            .tabs
            .read()
            .values()
            .any(|entry| entry.info.window == window);
        if !known {
            return Err(AppError::Capture(format!(
                "no window {} to focus",
                window.0
            )));
        }
        *self.focused.write() = Some(window);
        Ok(())
    }

    async fn activate_tab(&self, tab: TabId) -> AppResult<()> {
        let mut tabs = self.tabs.write();
        let window = match tabs.get(&tab) {
            Some(entry) => entry.info.window,
            None => return Err(AppError::Capture(format!("no tab {} to activate", tab.0))),
        };
        for entry in tabs.values_mut() {
            if entry.info.window == window {
                entry.active = entry.info.id == tab;
            }
        }
        Ok(())
    }

    async fn tab_active(&self, tab: TabId) -> Option<bool> {
        let tabs = self.tabs.read();
        let entry = tabs.get(&tab)?;
        if entry.info.page.is_closed() {
            return None;
        }
        Some(entry.active)
    }

    async fn capture_visible(&self, window: WindowId) -> AppResult<PngImage> {
        let page = {
            let tabs = self.tabs.read();
            tabs.values()
                .find(|entry| entry.info.window == window && entry.active)
                .map(|entry| entry.info.page.clone())
        };
        let page = page.ok_or_else(|| {
            AppError::Capture(format!("no active tab in window {}", window.0))
        })?;
        match page.render().await.answered() {
            Some(image) => Ok(image),
            None => Err(AppError::Capture(
                "capture aborted: target page closed".to_string(),
            )),
        }
    }
}
