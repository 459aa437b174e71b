use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{config_file_path, Settings};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut settings = Settings::load()?;

    println!("Configuring bugsnap.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(
        "Tracker host (e.g., company.atlassian.net)",
        &mut settings.tracker_host,
        false,
    )?;
    apply_prompt("Tracker identity (email)", &mut settings.identity, false)?;
    apply_prompt("Tracker API token", &mut settings.secret, true)?;
    apply_prompt("Project key", &mut settings.project_key, false)?;
    apply_prompt(
        "Issue type (default: Bug)",
        &mut settings.issue_type_name,
        false,
    )?;
    apply_prompt(
        "Version element selector (default: p.--technology-version)",
        &mut settings.scrape_selector,
        false,
    )?;
    apply_prompt("Front-end prefix (default: FE:)", &mut settings.fe_prefix, false)?;
    apply_prompt("Back-end prefix (default: BE:)", &mut settings.be_prefix, false)?;

    settings.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let settings = Settings::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Tracker host: {}", display_value(&settings.tracker_host));
    println!("Identity: {}", display_value(&settings.identity));
    println!("API token: {}", mask_secret(&settings.secret));
    println!("Project key: {}", display_value(&settings.project_key));
    println!("Issue type: {}", display_value(&settings.issue_type_name));
    println!(
        "Version selector: {}",
        display_value(&settings.scrape_selector)
    );
    println!("Front-end prefix: {}", display_value(&settings.fe_prefix));
    println!("Back-end prefix: {}", display_value(&settings.be_prefix));

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        Ok(PromptAction::Keep)
    } else if trimmed == "-" {
        Ok(PromptAction::Clear)
    } else {
        Ok(PromptAction::Set(trimmed.to_string()))
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.len() > 6 => {
            let prefix = &token[..3];
            let suffix = &token[token.len() - 3..];
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_and_short_secrets() {
        assert_eq!(
            mask_secret(&Some("abcdefghij".to_string())),
            "abc***hij"
        );
        assert_eq!(mask_secret(&Some("abc".to_string())), "***");
        assert_eq!(mask_secret(&None), "<not set>");
    }

    #[test]
    fn displays_missing_values_as_placeholders() {
        assert_eq!(display_value(&None), "<not set>");
        assert_eq!(display_value(&Some(String::new())), "<not set>");
        assert_eq!(display_value(&Some("BUG".to_string())), "BUG");
    }
}
