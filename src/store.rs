use parking_lot::RwLock;

use crate::config::Settings;
use crate::domain::bundle::{CaptureBundle, PngImage};

/// Process-wide store for the two shared records: the settings and the
/// single capture-bundle slot. Each slot is replaced wholesale under its
/// own lock; the last writer wins and there is no conflict detection.
pub struct SessionStore {
    settings: RwLock<Settings>,
    bundle: RwLock<Option<CaptureBundle>>,
}

impl SessionStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
            bundle: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn put_settings(&self, settings: Settings) {
        *self.settings.write() = settings;
    }

    pub fn bundle(&self) -> Option<CaptureBundle> {
        self.bundle.read().clone()
    }

    /// Replaces the bundle slot unconditionally. A capture that lands while
    /// a composer session is open silently supersedes the bundle the
    /// composer read.
    pub fn put_bundle(&self, bundle: CaptureBundle) {
        *self.bundle.write() = Some(bundle);
    }

    /// Rewrites only the screenshot of the current bundle, keeping the rest
    /// of the record. No-op when no bundle exists.
    pub fn replace_screenshot(&self, image: PngImage) {
        if let Some(bundle) = self.bundle.write().as_mut() {
            bundle.screenshot = image;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::probe::StaticDom;
    use crate::page::recorder::TracingSink;
    use crate::page::{spawn, PageSnapshot};
    use std::sync::Arc;

    fn bundle(url: &str) -> CaptureBundle {
        let page = spawn(
            PageSnapshot {
                url: url.to_string(),
                dom: StaticDom::default(),
                viewport: PngImage::blank(),
            },
            Arc::new(TracingSink),
        );
        CaptureBundle {
            source_url: url.to_string(),
            screenshot: PngImage::blank(),
            log_entries: Vec::new(),
            source_tab: page,
        }
    }

    #[tokio::test]
    async fn a_new_capture_supersedes_the_previous_bundle() {
        let store = SessionStore::new(Settings::default());
        store.put_bundle(bundle("https://one.example.com"));
        store.put_bundle(bundle("https://two.example.com"));
        assert_eq!(
            store.bundle().unwrap().source_url,
            "https://two.example.com"
        );
    }

    #[tokio::test]
    async fn replace_screenshot_keeps_the_rest_of_the_bundle() {
        let store = SessionStore::new(Settings::default());
        store.put_bundle(bundle("https://app.example.com"));

        let annotated = PngImage::from_bytes(vec![1, 2, 3]);
        store.replace_screenshot(annotated.clone());

        let current = store.bundle().unwrap();
        assert_eq!(current.screenshot, annotated);
        assert_eq!(current.source_url, "https://app.example.com");
    }

    #[test]
    fn replace_screenshot_without_a_bundle_is_a_no_op() {
        let store = SessionStore::new(Settings::default());
        store.replace_screenshot(PngImage::blank());
        assert!(store.bundle().is_none());
    }

    #[test]
    fn settings_updates_are_visible_to_later_readers() {
        let store = SessionStore::new(Settings::default());
        let mut updated = store.settings();
        updated.project_key = Some("BUG".to_string());
        store.put_settings(updated);
        assert_eq!(store.settings().project_key.as_deref(), Some("BUG"));
    }
}
