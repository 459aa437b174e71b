use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::warn;

use crate::background;
use crate::context::AppContext;
use crate::domain::bundle::{LogLevel, PngImage};
use crate::domain::draft::FieldSelection;
use crate::domain::schema::Cardinality;
use crate::error::{AppError, AppResult};
use crate::page::probe::{DomElement, StaticDom};
use crate::page::PageSnapshot;
use crate::workflow::compose::{FormControl, TicketComposer};
use crate::workflow::submit::SubmitOutcome;

#[derive(Debug, Clone)]
pub struct CaptureCommandArgs {
    pub session: PathBuf,
    pub summary: Option<String>,
    pub fields: Vec<String>,
    pub no_input: bool,
    pub keep_screenshot: Option<PathBuf>,
}

/// A recorded page session: the address, the settled element snapshot,
/// the console activity to replay, and optionally a real screenshot.
#[derive(Debug, Deserialize)]
pub struct PageFixture {
    pub url: String,
    #[serde(default)]
    pub elements: Vec<DomElement>,
    #[serde(default)]
    pub console: Vec<ConsoleLine>,
    #[serde(default)]
    pub screenshot_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ConsoleLine {
    pub level: LogLevel,
    pub args: Vec<serde_json::Value>,
}

impl PageFixture {
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|err| AppError::Configuration(format!("invalid page session file: {err}")))
    }

    fn snapshot(&self) -> AppResult<PageSnapshot> {
        let viewport = match &self.screenshot_path {
            Some(path) => PngImage::from_bytes(fs::read(path)?),
            None => PngImage::blank(),
        };
        Ok(PageSnapshot {
            url: self.url.clone(),
            dom: StaticDom::new(self.elements.clone()),
            viewport,
        })
    }
}

pub async fn run(ctx: &AppContext, args: CaptureCommandArgs) -> AppResult<()> {
    let fixture = PageFixture::load(&args.session)?;
    let snapshot = fixture.snapshot()?;

    // Page context first, so the recorder is installed before any of the
    // session's console activity replays.
    let tab = ctx.host.open_tab(snapshot).await?;
    for line in &fixture.console {
        tab.page.console(line.level, line.args.clone()).await;
    }

    // Background context: run the capture, then wait for the composer
    // signal it emits after persisting the bundle.
    let (handle, mut composer_rx) = background::spawn(
        ctx.host.clone(),
        ctx.store.clone(),
        ctx.tracker.clone(),
    );
    handle
        .capture(tab.clone())
        .await
        .answered()
        .ok_or_else(|| AppError::Channel("background context not reachable".to_string()))??;
    if composer_rx.recv().await.is_none() {
        return Err(AppError::Channel(
            "capture finished but no composer signal arrived".to_string(),
        ));
    }

    // Composer view.
    let composer = TicketComposer::new(
        ctx.store.clone(),
        handle,
        ctx.tracker.clone(),
        ctx.annotator.clone(),
    );
    let session = composer.prepare().await?;

    if let Some(path) = &args.keep_screenshot {
        fs::write(path, session.bundle.screenshot.as_bytes())?;
        println!("Screenshot written to {}", path.display());
    }
    if let Some(message) = &session.schema_error {
        println!("Warning: field schema unavailable ({message}); submitting without fields.");
    }

    println!("Captured {}", session.bundle.source_url);
    println!("{} console entries in the log block.", session.bundle.log_entries.len());
    println!("\nGenerated description:\n{}\n", session.description);

    let summary = match &args.summary {
        Some(summary) => summary.clone(),
        None if args.no_input => {
            return Err(AppError::Configuration(
                "a summary is required; pass --summary in no-input mode".to_string(),
            ));
        }
        None => prompt_line("One-line summary: ")?,
    };

    let description = if args.no_input {
        session.description.clone()
    } else {
        let replacement =
            prompt_line("Description (Enter to keep the generated text): ")?;
        if replacement.is_empty() {
            session.description.clone()
        } else {
            replacement
        }
    };

    let answers = if args.no_input || !args.fields.is_empty() {
        parse_field_args(&session.form, &args.fields)?
    } else {
        collect_answers(&session.form)?
    };

    let outcome = composer
        .submit(&session, &summary, description, answers)
        .await?;
    report_outcome(&outcome);

    if !args.no_input && offer_open(&outcome)? {
        open_in_browser(&outcome.ticket.url);
    }

    tab.page.close().await;
    Ok(())
}

fn report_outcome(outcome: &SubmitOutcome) {
    println!("\nTicket {} created: {}", outcome.ticket.key, outcome.ticket.url);
    if let Some(message) = &outcome.describe_error {
        println!("Warning: the description update failed: {message}");
    }
    if let Some(message) = &outcome.attach_error {
        println!("Warning: the screenshot upload failed: {message}");
    }
    if outcome.fully_succeeded() {
        println!("Description and screenshot are attached.");
    }
}

fn offer_open(outcome: &SubmitOutcome) -> AppResult<bool> {
    let answer = prompt_line(&format!(
        "Open {} in your browser? [y/N]: ",
        outcome.ticket.key
    ))?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

fn open_in_browser(url: &str) {
    let launcher = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    if let Err(err) = Command::new(launcher).arg(url).spawn() {
        warn!("could not launch a browser for {url}: {err}");
        println!("Open it manually: {url}");
    }
}

/// Parses `--field KEY=id[,id]` arguments against the rendered form.
fn parse_field_args(
    form: &[FormControl],
    fields: &[String],
) -> AppResult<Vec<(String, FieldSelection)>> {
    let mut answers = Vec::new();
    for raw in fields {
        let (key, ids) = raw.split_once('=').ok_or_else(|| {
            AppError::Configuration(format!("invalid --field value \"{raw}\"; expected KEY=id"))
        })?;
        let control = form.iter().find(|control| control.key == key).ok_or_else(|| {
            AppError::Configuration(format!("unknown field \"{key}\" for this issue type"))
        })?;
        let ids: Vec<String> = ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        let selection = match control.cardinality {
            Cardinality::Single => {
                if ids.len() != 1 {
                    return Err(AppError::Configuration(format!(
                        "field \"{key}\" takes exactly one value"
                    )));
                }
                FieldSelection::Single(ids.into_iter().next().unwrap_or_default())
            }
            Cardinality::Multiple => FieldSelection::Multiple(ids),
        };
        answers.push((key.to_string(), selection));
    }
    Ok(answers)
}

/// Interactive selection, one prompt per control. Empty input skips the
/// field (it is omitted from the ticket), except where the form suggests
/// a default.
fn collect_answers(form: &[FormControl]) -> AppResult<Vec<(String, FieldSelection)>> {
    let mut answers = Vec::new();
    for control in form {
        println!("\n{}:", control.label);
        for (index, option) in control.options.iter().enumerate() {
            let marker = if control.suggested == Some(index) {
                " (default)"
            } else {
                ""
            };
            println!("  {}) {}{marker}", index + 1, option.label);
        }
        let selection = match control.cardinality {
            Cardinality::Single => {
                let input = prompt_line("Choose one (Enter to skip): ")?;
                match parse_choice(&input, control.options.len()).or(control.suggested) {
                    Some(index) => FieldSelection::Single(control.options[index].id.clone()),
                    None => continue,
                }
            }
            Cardinality::Multiple => {
                let input = prompt_line("Choose any, comma-separated (Enter to skip): ")?;
                let picks = parse_multi_choice(&input, control.options.len());
                if picks.is_empty() {
                    continue;
                }
                FieldSelection::Multiple(
                    picks
                        .into_iter()
                        .map(|index| control.options[index].id.clone())
                        .collect(),
                )
            }
        };
        answers.push((control.key.clone(), selection));
    }
    Ok(answers)
}

fn parse_choice(input: &str, len: usize) -> Option<usize> {
    let number: usize = input.trim().parse().ok()?;
    (1..=len).contains(&number).then(|| number - 1)
}

fn parse_multi_choice(input: &str, len: usize) -> Vec<usize> {
    let mut picks = Vec::new();
    for part in input.split(',') {
        if let Some(index) = parse_choice(part, len) {
            if !picks.contains(&index) {
                picks.push(index);
            }
        }
    }
    picks
}

fn prompt_line(message: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{message}")?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::AllowedValue;

    fn form() -> Vec<FormControl> {
        vec![
            FormControl {
                key: "priority".to_string(),
                label: "Priority".to_string(),
                cardinality: Cardinality::Single,
                options: vec![AllowedValue {
                    id: "30".to_string(),
                    label: "High".to_string(),
                }],
                suggested: None,
            },
            FormControl {
                key: "customfield_10040".to_string(),
                label: "Affected System".to_string(),
                cardinality: Cardinality::Multiple,
                options: vec![
                    AllowedValue {
                        id: "9".to_string(),
                        label: "Checkout".to_string(),
                    },
                    AllowedValue {
                        id: "11".to_string(),
                        label: "Search".to_string(),
                    },
                ],
                suggested: None,
            },
        ]
    }

    #[test]
    fn parses_single_and_multi_field_args() {
        let answers = parse_field_args(
            &form(),
            &[
                "priority=30".to_string(),
                "customfield_10040=9,11".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(answers[0].1, FieldSelection::Single("30".to_string()));
        assert_eq!(
            answers[1].1,
            FieldSelection::Multiple(vec!["9".to_string(), "11".to_string()])
        );
    }

    #[test]
    fn rejects_unknown_fields_and_bad_cardinality() {
        let err = parse_field_args(&form(), &["nope=1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown field"));

        let err = parse_field_args(&form(), &["priority=30,31".to_string()]).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn choice_parsing_is_one_based_and_bounded() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("x", 3), None);
        assert_eq!(parse_choice("", 3), None);
    }

    #[test]
    fn multi_choice_ignores_junk() {
        assert_eq!(parse_multi_choice("1, 2, nope, 9", 2), vec![0, 1]);
        assert!(parse_multi_choice("", 2).is_empty());
    }

    #[test]
    fn fixture_files_parse_console_levels() {
        let fixture: PageFixture = serde_json::from_str(
            r#"{
                "url": "https://app.example.com/page",
                "elements": [{"selector": "p.--technology-version", "text": "FE: 1.0"}],
                "console": [{"level": "error", "args": ["boom"]}]
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.console[0].level, LogLevel::Error);
        assert_eq!(fixture.elements.len(), 1);
    }
}
