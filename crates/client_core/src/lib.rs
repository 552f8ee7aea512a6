//! Calendar client: a local mirror of the event store, driven by grid gestures.
//!
//! Every gesture issues at most one request and patches [`CalendarState`] only
//! after the server answers. Failures are logged and leave the local state as
//! it was.

use chrono::{NaiveDate, NaiveDateTime};
use shared::{
    domain::{EventId, EventRecord},
    protocol::EventDraft,
    time::format_naive,
};
use tracing::{debug, error, info, warn};

pub mod error;
pub mod geometry;
pub mod state;
pub mod transport;
pub mod types;

pub use error::ClientError;
pub use geometry::GridGeometry;
pub use state::CalendarState;
pub use transport::{EventBackend, HttpEventBackend};
pub use types::{
    DateWindow, DetailPopover, DraggedItem, EditForm, EventBadge, FormMode, Notice, Overlay,
    ScreenPoint, SlotSelection, ViewMode,
};

/// Outcome of [`CalendarClient::purge_past_events`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub deleted: Vec<EventId>,
    pub failed: Vec<EventId>,
}

pub struct CalendarClient<B: EventBackend> {
    backend: B,
    pub state: CalendarState,
}

impl<B: EventBackend> CalendarClient<B> {
    pub fn new(backend: B, today: NaiveDate) -> Self {
        Self {
            backend,
            state: CalendarState::new(today),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetches the full event list. On failure the list is left empty.
    pub async fn load(&mut self) -> Result<usize, ClientError> {
        match self.backend.list_events().await {
            Ok(events) => {
                let count = events.len();
                self.state.replace_all(events);
                info!(count, "events loaded");
                Ok(count)
            }
            Err(err) => {
                self.state.clear();
                error!(error = %err, "error fetching events");
                Err(err)
            }
        }
    }

    /// Opens a create form pre-filled with the selected range.
    pub fn select_slot(&mut self, start: NaiveDateTime, end: NaiveDateTime) {
        let slot = SlotSelection { start, end };
        self.state.selected_slot = Some(slot);
        self.state.selected_event = None;
        self.state.overlay = Overlay::Form(EditForm::for_slot(slot));
    }

    /// Shows the read-only summary for an event next to the click point.
    pub fn select_event(
        &mut self,
        event_id: &EventId,
        click: ScreenPoint,
    ) -> Result<DetailPopover, ClientError> {
        let details = DetailPopover::for_event(self.loaded(event_id)?, click);
        self.state.selected_event = Some(event_id.clone());
        self.state.selected_slot = None;
        self.state.overlay = Overlay::Details(details.clone());
        Ok(details)
    }

    /// Opens the edit form for an event, closing any popover.
    pub fn open_edit_form(&mut self, event_id: &EventId) -> Result<&mut EditForm, ClientError> {
        let form = EditForm::for_event(self.loaded(event_id)?);
        self.state.selected_event = Some(event_id.clone());
        self.state.overlay = Overlay::Form(form);
        self.state.form_mut().ok_or(ClientError::NoOpenForm)
    }

    /// Switches from the detail popover to the edit form of the same event.
    pub fn edit_selected(&mut self) -> Result<&mut EditForm, ClientError> {
        let event_id = self
            .state
            .details()
            .map(|details| details.event_id.clone())
            .ok_or(ClientError::NothingSelected)?;
        self.open_edit_form(&event_id)
    }

    pub fn close_overlays(&mut self) {
        self.state.close_overlay();
    }

    /// Submits the open form: create for a slot form, full replace for an
    /// edit form. The form closes only on success.
    pub async fn submit_form(&mut self) -> Result<EventRecord, ClientError> {
        let result = self.submit_form_inner().await;
        log_failure("saving event", result)
    }

    async fn submit_form_inner(&mut self) -> Result<EventRecord, ClientError> {
        let form = self.state.form().ok_or(ClientError::NoOpenForm)?.clone();
        let draft = form.to_draft();
        ensure_complete(&draft)?;

        let saved = match &form.mode {
            FormMode::Create => {
                let created = self.backend.create_event(&draft).await?;
                self.state.push(created.clone());
                info!(event_id = %created.id, "event created");
                created
            }
            FormMode::Edit(event_id) => {
                let updated = self.backend.update_event(event_id, &draft).await?;
                self.reconcile_update(updated.clone());
                info!(event_id = %updated.id, "event edited");
                updated
            }
        };
        self.state.close_overlay();
        self.state.selected_slot = None;
        Ok(saved)
    }

    /// Creates an event from an item dropped onto the grid from outside it.
    pub async fn drop_external(
        &mut self,
        item: &DraggedItem,
        point: ScreenPoint,
        geometry: &GridGeometry,
    ) -> Result<EventRecord, ClientError> {
        let result = self.drop_external_inner(item, point, geometry).await;
        log_failure("adding dropped event", result)
    }

    async fn drop_external_inner(
        &mut self,
        item: &DraggedItem,
        point: ScreenPoint,
        geometry: &GridGeometry,
    ) -> Result<EventRecord, ClientError> {
        let window = self.state.window();
        let (start, end) = geometry::drop_range(self.state.view, &window, geometry, point)
            .ok_or(ClientError::OutsideGrid)?;
        debug!(x = point.x, y = point.y, %start, %end, "external drop mapped");

        let draft = item.draft(start, end);
        ensure_complete(&draft)?;
        let created = self.backend.create_event(&draft).await?;
        self.state.push(created.clone());
        info!(event_id = %created.id, "dropped event added");
        Ok(created)
    }

    /// Moves an event to a new range via an internal drag.
    pub async fn move_event(
        &mut self,
        event_id: &EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Notice, ClientError> {
        let result = self.reschedule(event_id, start, end).await;
        log_failure("moving event", result)
    }

    /// Changes an event's range via a resize handle.
    pub async fn resize_event(
        &mut self,
        event_id: &EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Notice, ClientError> {
        let result = self.reschedule(event_id, start, end).await;
        log_failure("resizing event", result)
    }

    async fn reschedule(
        &mut self,
        event_id: &EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Notice, ClientError> {
        let mut draft = EventDraft::from(self.loaded(event_id)?);
        draft.start = Some(format_naive(start));
        draft.end = Some(format_naive(end));
        ensure_complete(&draft)?;

        let updated = self.backend.update_event(event_id, &draft).await?;
        self.reconcile_update(updated);
        info!(%event_id, %start, %end, "event rescheduled");
        Ok(Notice::EventUpdated)
    }

    /// Deletes an event once `confirm` approves it.
    pub async fn delete_event(
        &mut self,
        event_id: &EventId,
        confirm: impl FnOnce(&EventRecord) -> bool,
    ) -> Result<(), ClientError> {
        let result = self.delete_event_inner(event_id, confirm).await;
        log_failure("deleting event", result)
    }

    async fn delete_event_inner(
        &mut self,
        event_id: &EventId,
        confirm: impl FnOnce(&EventRecord) -> bool,
    ) -> Result<(), ClientError> {
        if !confirm(self.loaded(event_id)?) {
            return Err(ClientError::Cancelled);
        }
        self.backend.delete_event(event_id).await?;
        self.state.remove(event_id);
        info!(%event_id, "event deleted");
        Ok(())
    }

    /// Deletes every loaded event that ended before `now`, one request at a
    /// time. Events whose delete fails stay in the local list.
    pub async fn purge_past_events(&mut self, now: NaiveDateTime) -> PurgeReport {
        let now = now.and_utc();
        let expired: Vec<EventId> = self
            .state
            .events()
            .iter()
            .filter(|event| event.end < now)
            .map(|event| event.id.clone())
            .collect();

        let mut report = PurgeReport::default();
        for event_id in expired {
            match self.backend.delete_event(&event_id).await {
                Ok(_) => {
                    self.state.remove(&event_id);
                    report.deleted.push(event_id);
                }
                Err(err) => {
                    error!(%event_id, error = %err, "error deleting past event");
                    report.failed.push(event_id);
                }
            }
        }
        if !report.deleted.is_empty() {
            info!(deleted = report.deleted.len(), "past events purged");
        }
        report
    }

    fn loaded(&self, event_id: &EventId) -> Result<&EventRecord, ClientError> {
        self.state
            .event(event_id)
            .ok_or_else(|| ClientError::UnknownEvent(event_id.clone()))
    }

    fn reconcile_update(&mut self, updated: EventRecord) {
        let event_id = updated.id.clone();
        if !self.state.replace(updated.clone()) {
            warn!(%event_id, "updated event was not in the local list; appending");
            self.state.push(updated);
        }
        let position = match &self.state.overlay {
            Overlay::Details(details) if details.event_id == event_id => Some(details.position),
            _ => None,
        };
        let Some(position) = position else {
            return;
        };
        let Some(record) = self.state.event(&event_id) else {
            return;
        };
        let mut refreshed = DetailPopover::for_event(record, ScreenPoint::default());
        refreshed.position = position;
        self.state.overlay = Overlay::Details(refreshed);
    }
}

fn ensure_complete(draft: &EventDraft) -> Result<(), ClientError> {
    let missing = draft.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Incomplete { missing })
    }
}

fn log_failure<T>(action: &str, result: Result<T, ClientError>) -> Result<T, ClientError> {
    match &result {
        Err(ClientError::Cancelled) => debug!(action, "cancelled"),
        Err(err) => error!(error = %err, "error {action}"),
        Ok(_) => {}
    }
    result
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
