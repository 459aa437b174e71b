use async_trait::async_trait;

use crate::config::Settings;
use crate::domain::bundle::PngImage;
use crate::domain::draft::TicketDraft;
use crate::domain::schema::FieldSchema;
use crate::domain::ticket::Ticket;
use crate::error::AppResult;

/// The tracker's REST surface. Settings are passed per call so a running
/// session always uses the current credentials from the store.
#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Fetch the create-metadata field schema for the configured project
    /// and issue type.
    async fn fetch_create_meta(&self, settings: &Settings) -> AppResult<FieldSchema>;

    /// Create a minimal issue from the draft's summary and answered fields.
    async fn create_issue(&self, settings: &Settings, draft: &TicketDraft) -> AppResult<Ticket>;

    /// Put the full description onto an existing issue.
    async fn update_description(
        &self,
        settings: &Settings,
        key: &str,
        description: &str,
    ) -> AppResult<()>;

    /// Upload the screenshot as a multipart attachment.
    async fn attach_screenshot(
        &self,
        settings: &Settings,
        key: &str,
        image: &PngImage,
    ) -> AppResult<()>;
}
