use serde::{Deserialize, Serialize};

use crate::domain::{EventId, EventRecord};

pub const REQUIRED_EVENT_FIELDS: [&str; 4] = ["title", "category", "start", "end"];

/// Body of `POST /events` and `PUT /events/:id`.
///
/// Every field is optional on the wire so that an absent field surfaces as a
/// validation error naming it, rather than as a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl EventDraft {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            category: Some(category.into()),
            start: Some(start.into()),
            end: Some(end.into()),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Required fields that are absent or blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [&self.title, &self.category, &self.start, &self.end]
            .into_iter()
            .zip(REQUIRED_EVENT_FIELDS)
            .filter(|(value, _)| is_blank(value.as_deref()))
            .map(|(_, name)| name)
            .collect()
    }
}

impl From<&EventRecord> for EventDraft {
    fn from(record: &EventRecord) -> Self {
        Self {
            title: Some(record.title.clone()),
            category: Some(record.category.clone()),
            start: Some(record.start.to_rfc3339()),
            end: Some(record.end.to_rfc3339()),
            color: record.color.clone(),
        }
    }
}

pub fn missing_fields_message(missing: &[&str]) -> String {
    format!(
        "missing required fields: {}; all fields ({}) are required",
        missing.join(", "),
        REQUIRED_EVENT_FIELDS.join(", ")
    )
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).map_or(true, str::is_empty)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
    pub id: EventId,
}

impl DeleteConfirmation {
    pub fn for_event(id: EventId) -> Self {
        Self {
            message: "event deleted".to_string(),
            id,
        }
    }
}
