use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::background::BackgroundHandle;
use crate::bus::Outcome;
use crate::domain::bundle::{CaptureBundle, LogEntry, Versions};
use crate::domain::draft::{FieldSelection, TicketDraft};
use crate::domain::schema::{AllowedValue, Cardinality, FieldSchema};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, ScreenshotAnnotator};
use crate::store::SessionStore;
use crate::workflow::submit::{submit_ticket, SubmitOutcome};

/// One selection control of the composer form, derived from a schema
/// field that carries allowed values.
#[derive(Debug, Clone)]
pub struct FormControl {
    pub key: String,
    pub label: String,
    pub cardinality: Cardinality,
    pub options: Vec<AllowedValue>,
    /// Index of the option to preselect, when the tracker convention
    /// suggests one.
    pub suggested: Option<usize>,
}

/// Everything the composer view needs to render: the captured bundle,
/// derived page metadata, the generated description, and the form.
pub struct ComposerSession {
    pub bundle: CaptureBundle,
    pub versions: Versions,
    pub environment: String,
    pub description: String,
    pub form: Vec<FormControl>,
    /// Set when the schema could not be loaded; the form is empty then and
    /// the ticket can still be filed with summary and description only.
    pub schema_error: Option<String>,
}

/// Turns the current capture bundle plus the server-described field schema
/// into a submitted ticket.
pub struct TicketComposer {
    store: Arc<SessionStore>,
    background: BackgroundHandle,
    tracker: Arc<dyn IssueTrackerService>,
    annotator: Arc<dyn ScreenshotAnnotator>,
}

impl TicketComposer {
    pub fn new(
        store: Arc<SessionStore>,
        background: BackgroundHandle,
        tracker: Arc<dyn IssueTrackerService>,
        annotator: Arc<dyn ScreenshotAnnotator>,
    ) -> Self {
        Self {
            store,
            background,
            tracker,
            annotator,
        }
    }

    /// Loads the bundle, probes the originating page for versions, derives
    /// the environment, generates the description, and fetches the field
    /// schema through the background context.
    pub async fn prepare(&self) -> AppResult<ComposerSession> {
        let bundle = self.store.bundle().ok_or_else(|| {
            AppError::Capture("no capture bundle in the session store; run a capture first".to_string())
        })?;

        let probe = self.store.settings().probe_config();
        let versions = match bundle.source_tab.versions(probe).await {
            Outcome::Answered(versions) => versions,
            Outcome::NoResponder => {
                warn!("originating page is gone; versions unavailable");
                Versions::default()
            }
        };

        let environment = derive_environment(&bundle.source_url);
        let description = generate_description(
            &versions,
            &environment,
            &bundle.source_url,
            &bundle.log_entries,
        );

        let (form, schema_error) = match self.background.load_schema().await {
            Outcome::Answered(Ok(schema)) => (build_form(&schema), None),
            Outcome::Answered(Err(message)) => {
                warn!("schema load failed: {message}");
                (Vec::new(), Some(message))
            }
            Outcome::NoResponder => {
                warn!("background context not reachable for schema load");
                (Vec::new(), Some("background context not reachable".to_string()))
            }
        };

        debug!(
            controls = form.len(),
            logs = bundle.log_entries.len(),
            "composer session prepared"
        );
        Ok(ComposerSession {
            bundle,
            versions,
            environment,
            description,
            form,
            schema_error,
        })
    }

    /// Validates the draft, rasterizes the annotation into the bundle's
    /// screenshot, and drives the three-step creation protocol.
    pub async fn submit(
        &self,
        session: &ComposerSession,
        summary: &str,
        description: String,
        answers: Vec<(String, FieldSelection)>,
    ) -> AppResult<SubmitOutcome> {
        let draft = assemble_draft(summary, description, answers)?;

        let annotated = self.annotator.annotate(session.bundle.screenshot.clone());
        self.store.replace_screenshot(annotated.clone());

        let settings = self.store.settings();
        submit_ticket(self.tracker.as_ref(), &settings, &draft, &annotated).await
    }
}

/// The hostname of the captured page, or the raw address when it does not
/// parse as a URL with a host (internal pages and the like).
pub fn derive_environment(source_url: &str) -> String {
    match Url::parse(source_url) {
        Ok(parsed) => parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| source_url.to_string()),
        Err(_) => source_url.to_string(),
    }
}

/// Bullet lines for FE version, BE version, environment, and URL, in that
/// order, skipping empty values, followed by the console logs in a fenced
/// block when any were captured.
pub fn generate_description(
    versions: &Versions,
    environment: &str,
    source_url: &str,
    log_entries: &[LogEntry],
) -> String {
    let bullets = [
        ("FE Version", versions.fe_version.as_str()),
        ("BE Version", versions.be_version.as_str()),
        ("Environment", environment),
        ("URL", source_url),
    ]
    .iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("* {label}: {value}"))
    .collect::<Vec<_>>()
    .join("\n");

    if log_entries.is_empty() {
        return bullets;
    }

    let log_lines = log_entries
        .iter()
        .map(LogEntry::render_args)
        .collect::<Vec<_>>()
        .join("\n");
    format!("{bullets}\n*Console Logs:*\n```\n{log_lines}\n```")
}

/// One control per schema field that carries allowed values. The priority
/// field preselects the value labeled "Medium" when the tracker offers it.
pub fn build_form(schema: &FieldSchema) -> Vec<FormControl> {
    schema
        .selectable()
        .map(|field| {
            let suggested = if field.key == "priority" {
                field
                    .allowed_values
                    .iter()
                    .position(|value| value.label.eq_ignore_ascii_case("medium"))
            } else {
                None
            };
            FormControl {
                key: field.key.clone(),
                label: field.display_name.clone(),
                cardinality: field.cardinality,
                options: field.allowed_values.clone(),
                suggested,
            }
        })
        .collect()
}

/// Builds the draft from the collected answers. Empty selections count as
/// unanswered and are dropped rather than sent as empty values.
pub fn assemble_draft(
    summary: &str,
    description: String,
    answers: Vec<(String, FieldSelection)>,
) -> AppResult<TicketDraft> {
    let mut draft = TicketDraft {
        summary: summary.trim().to_string(),
        description,
        ..TicketDraft::default()
    };
    for (key, selection) in answers {
        if selection.is_empty() {
            continue;
        }
        draft.selections.insert(key, selection);
    }
    draft.validate()?;
    Ok(draft)
}
