use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::domain::bundle::PngImage;
use crate::domain::draft::TicketDraft;
use crate::domain::schema::{AllowedValue, Cardinality, FieldSchema, FieldSpec};
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const CREATE_META_EXPAND: &str = "projects.issuetypes.fields";

pub struct JiraClient {
    http: Client,
}

impl JiraClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    fn auth_header(identity: &str, secret: &str) -> String {
        let credentials = format!("{identity}:{secret}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn issue_endpoint(host: &str) -> String {
        format!("https://{}/rest/api/2/issue", host.trim_matches('/'))
    }

    fn browse_url(host: &str, key: &str) -> String {
        format!("https://{}/browse/{}", host.trim_matches('/'), key)
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn fetch_create_meta(&self, settings: &Settings) -> AppResult<FieldSchema> {
        let auth = settings.tracker_auth()?;
        let url = format!("{}/createmeta", Self::issue_endpoint(auth.host));
        debug!(%url, project = auth.project_key, "fetching create-meta");

        let response = self
            .http
            .get(url)
            .query(&[
                ("projectKeys", auth.project_key),
                ("issuetypeNames", auth.issue_type),
                ("expand", CREATE_META_EXPAND),
            ])
            .header(AUTHORIZATION, Self::auth_header(auth.identity, auth.secret))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Tracker(format!("create-meta request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Tracker(format!(
                "create-meta returned {status}: {body}"
            )));
        }

        let payload: CreateMetaResponse = response.json().await.map_err(|err| {
            AppError::Tracker(format!("failed to parse create-meta response: {err}"))
        })?;

        parse_create_meta(payload, auth.issue_type)
    }

    async fn create_issue(&self, settings: &Settings, draft: &TicketDraft) -> AppResult<Ticket> {
        draft.validate()?;
        let auth = settings.tracker_auth()?;

        let mut fields = serde_json::Map::new();
        fields.insert("project".to_string(), json!({ "key": auth.project_key }));
        fields.insert("summary".to_string(), json!(draft.summary.trim()));
        fields.insert("issuetype".to_string(), json!({ "name": auth.issue_type }));
        fields.extend(draft.fields_payload());
        debug!(count = fields.len(), "creating issue");

        let response = self
            .http
            .post(Self::issue_endpoint(auth.host))
            .header(AUTHORIZATION, Self::auth_header(auth.identity, auth.secret))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|err| AppError::Tracker(format!("failed to call tracker: {err}")))?;

        let status = response.status();
        let payload: CreateIssueResponse = response.json().await.map_err(|err| {
            AppError::Tracker(format!("failed to parse create response ({status}): {err}"))
        })?;

        match payload.key {
            Some(key) if status.is_success() => {
                let url = Self::browse_url(auth.host, &key);
                Ok(Ticket { key, url })
            }
            _ => {
                let detail = if payload.error_messages.is_empty() {
                    format!("tracker responded with {status}")
                } else {
                    payload.error_messages.join(", ")
                };
                Err(AppError::Tracker(format!(
                    "could not create issue: {detail}"
                )))
            }
        }
    }

    async fn update_description(
        &self,
        settings: &Settings,
        key: &str,
        description: &str,
    ) -> AppResult<()> {
        let auth = settings.tracker_auth()?;
        let url = format!("{}/{}", Self::issue_endpoint(auth.host), key);

        let response = self
            .http
            .put(url)
            .header(AUTHORIZATION, Self::auth_header(auth.identity, auth.secret))
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "fields": { "description": description } }))
            .send()
            .await
            .map_err(|err| AppError::Tracker(format!("failed to update description: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Tracker(format!(
                "description update returned {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn attach_screenshot(
        &self,
        settings: &Settings,
        key: &str,
        image: &PngImage,
    ) -> AppResult<()> {
        let auth = settings.tracker_auth()?;
        let url = format!("{}/{}/attachments", Self::issue_endpoint(auth.host), key);

        let part = multipart::Part::bytes(image.as_bytes().to_vec())
            .file_name("screenshot.png")
            .mime_str("image/png")
            .map_err(|err| AppError::Tracker(format!("invalid attachment part: {err}")))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, Self::auth_header(auth.identity, auth.secret))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form)
            .send()
            .await
            .map_err(|err| AppError::Tracker(format!("failed to upload attachment: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Tracker(format!(
                "attachment upload returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

fn parse_create_meta(payload: CreateMetaResponse, issue_type: &str) -> AppResult<FieldSchema> {
    let project = payload
        .projects
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Tracker("no projects in create-meta response".to_string()))?;

    let issuetype = project
        .issuetypes
        .into_iter()
        .find(|it| it.name == issue_type)
        .ok_or_else(|| {
            AppError::Tracker(format!("issue type \"{issue_type}\" not found in create-meta"))
        })?;

    if issuetype.fields.is_empty() {
        warn!(issue_type, "create-meta carries no fields");
    }

    let fields = issuetype
        .fields
        .into_iter()
        .map(|(key, field)| {
            let cardinality = match field.schema.and_then(|s| s.kind) {
                Some(kind) if kind == "array" => Cardinality::Multiple,
                _ => Cardinality::Single,
            };
            FieldSpec {
                key,
                display_name: field.name,
                allowed_values: field
                    .allowed_values
                    .into_iter()
                    .map(|value| AllowedValue {
                        id: value.id,
                        // Some tracker setups label values with `name`,
                        // others with `value`.
                        label: value.name.or(value.value).unwrap_or_default(),
                    })
                    .collect(),
                cardinality,
            }
        })
        .collect();

    Ok(FieldSchema::new(fields))
}

#[derive(Deserialize)]
struct CreateMetaResponse {
    #[serde(default)]
    projects: Vec<MetaProject>,
}

#[derive(Deserialize)]
struct MetaProject {
    #[serde(default)]
    issuetypes: Vec<MetaIssueType>,
}

#[derive(Deserialize)]
struct MetaIssueType {
    name: String,
    #[serde(default)]
    fields: std::collections::BTreeMap<String, MetaField>,
}

#[derive(Deserialize)]
struct MetaField {
    name: String,
    #[serde(default, rename = "allowedValues")]
    allowed_values: Vec<MetaAllowedValue>,
    schema: Option<MetaFieldSchema>,
}

#[derive(Deserialize)]
struct MetaAllowedValue {
    id: String,
    name: Option<String>,
    value: Option<String>,
}

#[derive(Deserialize)]
struct MetaFieldSchema {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct CreateIssueResponse {
    key: Option<String>,
    #[serde(default, rename = "errorMessages")]
    error_messages: Vec<String>,
}
