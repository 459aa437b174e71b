pub mod capture;
pub mod compose;
pub mod submit;

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::background;
    use crate::config::Settings;
    use crate::domain::bundle::{LogLevel, PngImage};
    use crate::domain::draft::{FieldSelection, TicketDraft};
    use crate::domain::schema::{AllowedValue, Cardinality, FieldSchema, FieldSpec};
    use crate::domain::ticket::Ticket;
    use crate::error::AppResult;
    use crate::infra::host::LocalHost;
    use crate::page::probe::StaticDom;
    use crate::page::PageSnapshot;
    use crate::services::{BrowserHost, IssueTrackerService, PassthroughAnnotator};
    use crate::store::SessionStore;
    use crate::workflow::compose::TicketComposer;

    /// Serves a priority schema and records the created draft.
    #[derive(Default)]
    struct FakeTracker {
        created: Mutex<Option<TicketDraft>>,
        described: Mutex<Option<String>>,
        attached: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl IssueTrackerService for FakeTracker {
        async fn fetch_create_meta(&self, _settings: &Settings) -> AppResult<FieldSchema> {
            Ok(FieldSchema::new(vec![FieldSpec {
                key: "priority".to_string(),
                display_name: "Priority".to_string(),
                allowed_values: vec![
                    AllowedValue {
                        id: "10".to_string(),
                        label: "Low".to_string(),
                    },
                    AllowedValue {
                        id: "20".to_string(),
                        label: "Medium".to_string(),
                    },
                    AllowedValue {
                        id: "30".to_string(),
                        label: "High".to_string(),
                    },
                ],
                cardinality: Cardinality::Single,
            }]))
        }

        async fn create_issue(
            &self,
            _settings: &Settings,
            draft: &TicketDraft,
        ) -> AppResult<Ticket> {
            *self.created.lock() = Some(draft.clone());
            Ok(Ticket {
                key: "BUG-42".to_string(),
                url: "https://tracker.example.com/browse/BUG-42".to_string(),
            })
        }

        async fn update_description(
            &self,
            _settings: &Settings,
            _key: &str,
            description: &str,
        ) -> AppResult<()> {
            *self.described.lock() = Some(description.to_string());
            Ok(())
        }

        async fn attach_screenshot(
            &self,
            _settings: &Settings,
            _key: &str,
            image: &PngImage,
        ) -> AppResult<()> {
            *self.attached.lock() = Some(image.len());
            Ok(())
        }
    }

    #[tokio::test]
    async fn capture_to_ticket_end_to_end() {
        let store = Arc::new(SessionStore::new(Settings::default()));
        let host = Arc::new(LocalHost::new());
        let tracker = Arc::new(FakeTracker::default());

        // Page context: no version markers, one console error.
        let tab = host
            .open_tab(PageSnapshot {
                url: "https://app.example.com/page".to_string(),
                dom: StaticDom::default(),
                viewport: PngImage::blank(),
            })
            .await
            .unwrap();
        tab.page.console(LogLevel::Error, vec![json!("boom")]).await;

        // Background context runs the capture and signals the composer.
        let (handle, mut composer_rx) =
            background::spawn(host.clone(), store.clone(), tracker.clone());
        handle.capture(tab.clone()).await.answered().unwrap().unwrap();
        assert!(composer_rx.recv().await.is_some());

        // Composer view: generated description has exactly one bullet plus
        // the log block, and the form offers the priority control.
        let composer = TicketComposer::new(
            store.clone(),
            handle,
            tracker.clone(),
            Arc::new(PassthroughAnnotator),
        );
        let session = composer.prepare().await.unwrap();
        assert_eq!(
            session.description,
            "* Environment: app.example.com\n* URL: https://app.example.com/page\n*Console Logs:*\n```\nboom\n```"
        );
        assert_eq!(session.form.len(), 1);
        let high = session.form[0]
            .options
            .iter()
            .find(|value| value.label == "High")
            .unwrap()
            .id
            .clone();

        let outcome = composer
            .submit(
                &session,
                "Button broken",
                session.description.clone(),
                vec![("priority".to_string(), FieldSelection::Single(high))],
            )
            .await
            .unwrap();
        assert!(outcome.fully_succeeded());
        assert_eq!(outcome.ticket.key, "BUG-42");

        let created = tracker.created.lock().clone().unwrap();
        assert_eq!(created.summary, "Button broken");
        assert_eq!(
            created.fields_payload()["priority"],
            json!({ "id": "30" })
        );

        let described = tracker.described.lock().clone().unwrap();
        assert!(described.contains("boom"));
        assert!(tracker.attached.lock().is_some());
    }

    #[tokio::test]
    async fn versions_survive_into_the_description() {
        let store = Arc::new(SessionStore::new(Settings::default()));
        let host = Arc::new(LocalHost::new());
        let tracker = Arc::new(FakeTracker::default());

        let tab = host
            .open_tab(PageSnapshot {
                url: "https://app.example.com/".to_string(),
                dom: StaticDom::new(vec![
                    crate::page::probe::DomElement {
                        selector: "p.--technology-version".to_string(),
                        text: "FE: 2.4.1".to_string(),
                    },
                    crate::page::probe::DomElement {
                        selector: "p.--technology-version".to_string(),
                        text: "BE: 9.0.3".to_string(),
                    },
                ]),
                viewport: PngImage::blank(),
            })
            .await
            .unwrap();

        let (handle, mut composer_rx) =
            background::spawn(host.clone(), store.clone(), tracker.clone());
        handle.capture(tab).await.answered().unwrap().unwrap();
        composer_rx.recv().await.unwrap();

        let composer =
            TicketComposer::new(store, handle, tracker, Arc::new(PassthroughAnnotator));
        let session = composer.prepare().await.unwrap();
        assert_eq!(session.versions.fe_version, "2.4.1");
        assert!(session
            .description
            .starts_with("* FE Version: 2.4.1\n* BE Version: 9.0.3\n* Environment: app.example.com"));
    }
}
