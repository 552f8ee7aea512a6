//! Transport-free event operations.
//!
//! Each operation validates its input, performs one store call and maps the
//! outcome onto the [`ApiError`] taxonomy. HTTP framing lives in the server
//! binary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    domain::{EventId, EventRecord},
    error::{ApiError, ErrorCode},
    protocol::{missing_fields_message, DeleteConfirmation, EventDraft},
    time::parse_timestamp,
};
use storage::{EventStore, NewEvent, StoredEvent};
use thiserror::Error;
use tracing::{error, info, warn};

/// Write-side rules that vary per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventPolicy {
    /// Reject records whose `end` precedes their `start`.
    pub require_end_after_start: bool,
}

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn EventStore>,
    pub policy: EventPolicy,
}

impl ApiContext {
    pub fn new(store: impl EventStore + 'static, policy: EventPolicy) -> Self {
        Self {
            store: Arc::new(store),
            policy,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("{}", missing_fields_message(.0))]
    Missing(Vec<&'static str>),
    #[error("{field} is not a valid timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("end ({end}) must not be before start ({start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl From<DraftError> for ApiError {
    fn from(value: DraftError) -> Self {
        ApiError::validation(value.to_string())
    }
}

pub fn validate_draft(draft: &EventDraft, policy: EventPolicy) -> Result<NewEvent, DraftError> {
    let missing = draft.missing_fields();
    if !missing.is_empty() {
        return Err(DraftError::Missing(missing));
    }

    let field = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
    let start = timestamp_field("start", draft.start.as_deref())?;
    let end = timestamp_field("end", draft.end.as_deref())?;
    if policy.require_end_after_start && end < start {
        return Err(DraftError::EndBeforeStart { start, end });
    }

    Ok(NewEvent {
        title: field(&draft.title),
        category: field(&draft.category),
        start,
        end,
        color: draft
            .color
            .as_deref()
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .map(str::to_string),
    })
}

fn timestamp_field(field: &'static str, raw: Option<&str>) -> Result<DateTime<Utc>, DraftError> {
    let raw = raw.unwrap_or_default();
    parse_timestamp(raw).ok_or_else(|| DraftError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.store.health_check().await.map_err(internal)
}

pub async fn create_event(ctx: &ApiContext, draft: &EventDraft) -> Result<EventRecord, ApiError> {
    let event = validate_draft(draft, ctx.policy).map_err(|err| {
        warn!(error = %err, "rejected event create");
        ApiError::from(err)
    })?;
    let stored = ctx.store.insert_event(&event).await.map_err(internal)?;
    info!(event_id = %stored.event_id, title = %stored.title, "event created");
    Ok(to_record(stored))
}

pub async fn list_events(ctx: &ApiContext) -> Result<Vec<EventRecord>, ApiError> {
    let events = ctx.store.list_events().await.map_err(internal)?;
    Ok(events.into_iter().map(to_record).collect())
}

pub async fn update_event(
    ctx: &ApiContext,
    event_id: &EventId,
    draft: &EventDraft,
) -> Result<EventRecord, ApiError> {
    let event = validate_draft(draft, ctx.policy).map_err(|err| {
        warn!(%event_id, error = %err, "rejected event update");
        ApiError::from(err)
    })?;
    let stored = ctx
        .store
        .replace_event(event_id, &event)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(event_id))?;
    info!(%event_id, "event updated");
    Ok(to_record(stored))
}

pub async fn delete_event(
    ctx: &ApiContext,
    event_id: &EventId,
) -> Result<DeleteConfirmation, ApiError> {
    let deleted = ctx.store.delete_event(event_id).await.map_err(internal)?;
    if !deleted {
        return Err(not_found(event_id));
    }
    info!(%event_id, "event deleted");
    Ok(DeleteConfirmation::for_event(event_id.clone()))
}

fn to_record(stored: StoredEvent) -> EventRecord {
    EventRecord {
        id: stored.event_id,
        title: stored.title,
        category: stored.category,
        start: stored.start,
        end: stored.end,
        color: stored.color,
        created_at: Some(stored.created_at),
        updated_at: Some(stored.updated_at),
    }
}

fn not_found(event_id: &EventId) -> ApiError {
    warn!(%event_id, "event not found");
    ApiError::not_found("event not found")
}

fn internal(err: anyhow::Error) -> ApiError {
    let message = format!("{err:#}");
    error!(error = %message, "event store failure");
    ApiError::new(ErrorCode::Internal, message)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
