pub mod host;
pub mod issue_tracker;

pub use host::{BrowserHost, PassthroughAnnotator, ScreenshotAnnotator, TabId, TabInfo, WindowId};
pub use issue_tracker::IssueTrackerService;
