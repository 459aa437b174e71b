use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

/// A user's answer for one schema field, shaped by the field's cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldSelection {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldSelection::Single(id) => id.is_empty(),
            FieldSelection::Multiple(ids) => ids.is_empty(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            FieldSelection::Single(id) => json!({ "id": id }),
            FieldSelection::Multiple(ids) => {
                Value::Array(ids.iter().map(|id| json!({ "id": id })).collect())
            }
        }
    }
}

/// In-memory ticket draft for one composer session.
#[derive(Debug, Clone, Default)]
pub struct TicketDraft {
    pub summary: String,
    pub description: String,
    /// Answered fields only; unanswered fields are absent, never null.
    pub selections: BTreeMap<String, FieldSelection>,
}

impl TicketDraft {
    pub fn validate(&self) -> AppResult<()> {
        if self.summary.trim().is_empty() {
            return Err(AppError::Configuration(
                "summary must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The answered dynamic fields rendered for a create request:
    /// `{"id": x}` for single-select, `[{"id": y1}, {"id": y2}]` for
    /// multi-select.
    pub fn fields_payload(&self) -> serde_json::Map<String, Value> {
        self.selections
            .iter()
            .filter(|(_, selection)| !selection.is_empty())
            .map(|(key, selection)| (key.clone(), selection.to_value()))
            .collect()
    }
}
