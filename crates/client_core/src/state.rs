use chrono::NaiveDate;
use shared::domain::{EventId, EventRecord};

use crate::types::{DateWindow, DetailPopover, EditForm, EventBadge, Overlay, SlotSelection, ViewMode};

/// Local mirror of the event store plus view and overlay state.
#[derive(Debug, Clone, Default)]
pub struct CalendarState {
    events: Vec<EventRecord>,
    pub view: ViewMode,
    pub anchor: NaiveDate,
    pub overlay: Overlay,
    pub selected_event: Option<EventId>,
    pub selected_slot: Option<SlotSelection>,
}

impl CalendarState {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn event(&self, event_id: &EventId) -> Option<&EventRecord> {
        self.events.iter().find(|event| &event.id == event_id)
    }

    pub fn replace_all(&mut self, events: Vec<EventRecord>) {
        self.events = events;
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push(&mut self, event: EventRecord) {
        self.events.push(event);
    }

    /// Swaps in the server's copy of an event. Returns false if it was not loaded.
    pub fn replace(&mut self, event: EventRecord) -> bool {
        match self.events.iter_mut().find(|existing| existing.id == event.id) {
            Some(existing) => {
                *existing = event;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, event_id: &EventId) -> Option<EventRecord> {
        let index = self.events.iter().position(|event| &event.id == event_id)?;
        if self.selected_event.as_ref() == Some(event_id) {
            self.selected_event = None;
        }
        if matches!(&self.overlay, Overlay::Details(details) if &details.event_id == event_id) {
            self.overlay = Overlay::Closed;
        }
        Some(self.events.remove(index))
    }

    pub fn window(&self) -> DateWindow {
        self.view.window_for(self.anchor)
    }

    /// Events overlapping the displayed window, ordered by start.
    pub fn visible_events(&self) -> Vec<&EventRecord> {
        let (from, to) = self.window().bounds();
        let (from, to) = (from.and_utc(), to.and_utc());
        let mut visible: Vec<&EventRecord> = self
            .events
            .iter()
            .filter(|event| event.overlaps(from, to))
            .collect();
        visible.sort_by_key(|event| event.start);
        visible
    }

    pub fn badges(&self) -> Vec<EventBadge> {
        self.visible_events()
            .into_iter()
            .map(EventBadge::from)
            .collect()
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    pub fn next(&mut self) {
        self.anchor = self.view.step_forward(self.anchor);
    }

    pub fn previous(&mut self) {
        self.anchor = self.view.step_back(self.anchor);
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.anchor = date;
    }

    pub fn form(&self) -> Option<&EditForm> {
        match &self.overlay {
            Overlay::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut EditForm> {
        match &mut self.overlay {
            Overlay::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&DetailPopover> {
        match &self.overlay {
            Overlay::Details(details) => Some(details),
            _ => None,
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::Closed;
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
