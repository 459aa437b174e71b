pub mod host;
pub mod jira;
