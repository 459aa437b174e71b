use tracing::{error, info};

use crate::config::Settings;
use crate::domain::bundle::PngImage;
use crate::domain::draft::TicketDraft;
use crate::domain::ticket::Ticket;
use crate::error::AppResult;
use crate::services::IssueTrackerService;

/// Terminal state of the creation protocol. The ticket exists whenever
/// this is returned; the two enrichment steps report their failures here
/// instead of failing the flow.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub ticket: Ticket,
    pub describe_error: Option<String>,
    pub attach_error: Option<String>,
}

impl SubmitOutcome {
    pub fn fully_succeeded(&self) -> bool {
        self.describe_error.is_none() && self.attach_error.is_none()
    }
}

/// Drives the three-step protocol: create the issue, put the description
/// on it, attach the screenshot. Only the create step is fatal; the later
/// steps are best-effort enrichments of a ticket that already exists.
pub async fn submit_ticket(
    tracker: &dyn IssueTrackerService,
    settings: &Settings,
    draft: &TicketDraft,
    screenshot: &PngImage,
) -> AppResult<SubmitOutcome> {
    let ticket = tracker.create_issue(settings, draft).await?;
    info!(key = %ticket.key, "issue created");

    let describe_error = tracker
        .update_description(settings, &ticket.key, &draft.description)
        .await
        .err()
        .map(|err| err.to_string());
    if let Some(message) = &describe_error {
        error!("issue {} created, but the description update failed: {message}", ticket.key);
    }

    let attach_error = tracker
        .attach_screenshot(settings, &ticket.key, screenshot)
        .await
        .err()
        .map(|err| err.to_string());
    if let Some(message) = &attach_error {
        error!("issue {} created, but the screenshot upload failed: {message}", ticket.key);
    }

    Ok(SubmitOutcome {
        ticket,
        describe_error,
        attach_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FieldSchema;
    use crate::error::AppError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTracker {
        calls: Mutex<Vec<&'static str>>,
        fail_create: bool,
        fail_describe: bool,
        fail_attach: bool,
    }

    #[async_trait]
    impl IssueTrackerService for RecordingTracker {
        async fn fetch_create_meta(&self, _settings: &Settings) -> AppResult<FieldSchema> {
            self.calls.lock().push("meta");
            Ok(FieldSchema::default())
        }

        async fn create_issue(
            &self,
            _settings: &Settings,
            _draft: &TicketDraft,
        ) -> AppResult<Ticket> {
            self.calls.lock().push("create");
            if self.fail_create {
                return Err(AppError::Tracker("could not create issue: 400".to_string()));
            }
            Ok(Ticket {
                key: "BUG-7".to_string(),
                url: "https://tracker.example.com/browse/BUG-7".to_string(),
            })
        }

        async fn update_description(
            &self,
            _settings: &Settings,
            _key: &str,
            _description: &str,
        ) -> AppResult<()> {
            self.calls.lock().push("describe");
            if self.fail_describe {
                return Err(AppError::Tracker("description update returned 500".to_string()));
            }
            Ok(())
        }

        async fn attach_screenshot(
            &self,
            _settings: &Settings,
            _key: &str,
            _image: &PngImage,
        ) -> AppResult<()> {
            self.calls.lock().push("attach");
            if self.fail_attach {
                return Err(AppError::Tracker("attachment upload returned 413".to_string()));
            }
            Ok(())
        }
    }

    fn draft() -> TicketDraft {
        TicketDraft {
            summary: "Button broken".to_string(),
            description: "* URL: https://app.example.com".to_string(),
            ..TicketDraft::default()
        }
    }

    #[tokio::test]
    async fn create_failure_stops_the_protocol() {
        let tracker = RecordingTracker {
            fail_create: true,
            ..RecordingTracker::default()
        };
        let result = submit_ticket(&tracker, &Settings::default(), &draft(), &PngImage::blank()).await;
        assert!(result.is_err());
        assert_eq!(*tracker.calls.lock(), vec!["create"]);
    }

    #[tokio::test]
    async fn describe_failure_still_runs_the_attach_step() {
        let tracker = RecordingTracker {
            fail_describe: true,
            ..RecordingTracker::default()
        };
        let outcome = submit_ticket(&tracker, &Settings::default(), &draft(), &PngImage::blank())
            .await
            .unwrap();
        assert_eq!(*tracker.calls.lock(), vec!["create", "describe", "attach"]);
        assert!(outcome.describe_error.is_some());
        assert!(outcome.attach_error.is_none());
        assert_eq!(outcome.ticket.key, "BUG-7");
    }

    #[tokio::test]
    async fn attach_failure_is_reported_but_not_fatal() {
        let tracker = RecordingTracker {
            fail_attach: true,
            ..RecordingTracker::default()
        };
        let outcome = submit_ticket(&tracker, &Settings::default(), &draft(), &PngImage::blank())
            .await
            .unwrap();
        assert!(outcome.attach_error.is_some());
        assert!(!outcome.fully_succeeded());
    }

    #[tokio::test]
    async fn a_clean_run_reports_full_success() {
        let tracker = RecordingTracker::default();
        let outcome = submit_ticket(&tracker, &Settings::default(), &draft(), &PngImage::blank())
            .await
            .unwrap();
        assert!(outcome.fully_succeeded());
        assert_eq!(*tracker.calls.lock(), vec!["create", "describe", "attach"]);
    }
}
