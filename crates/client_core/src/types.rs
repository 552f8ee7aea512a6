use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{EventId, EventRecord, DEFAULT_EVENT_COLOR},
    protocol::EventDraft,
    time::format_naive,
};

/// Offset of the detail popover from the click point, in pixels.
pub const DETAILS_OFFSET_PX: f64 = 30.0;
pub const UPDATE_SUCCESS_NOTICE: &str = "Event updated successfully!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Day,
    Week,
    #[default]
    Month,
}

impl ViewMode {
    /// Inclusive date range displayed when the view is anchored at `anchor`.
    pub fn window_for(self, anchor: NaiveDate) -> DateWindow {
        match self {
            ViewMode::Day => DateWindow {
                start: anchor,
                end: anchor,
            },
            ViewMode::Week => {
                let start = week_start(anchor);
                DateWindow {
                    start,
                    end: start + Days::new(6),
                }
            }
            ViewMode::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(first);
                DateWindow {
                    start: week_start(first),
                    end: week_start(last) + Days::new(6),
                }
            }
        }
    }

    pub fn step_forward(self, anchor: NaiveDate) -> NaiveDate {
        match self {
            ViewMode::Day => anchor.checked_add_days(Days::new(1)),
            ViewMode::Week => anchor.checked_add_days(Days::new(7)),
            ViewMode::Month => anchor.checked_add_months(Months::new(1)),
        }
        .unwrap_or(anchor)
    }

    pub fn step_back(self, anchor: NaiveDate) -> NaiveDate {
        match self {
            ViewMode::Day => anchor.checked_sub_days(Days::new(1)),
            ViewMode::Week => anchor.checked_sub_days(Days::new(7)),
            ViewMode::Month => anchor.checked_sub_months(Months::new(1)),
        }
        .unwrap_or(anchor)
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn days(&self) -> u32 {
        u32::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    pub fn day(&self, offset: u32) -> Option<NaiveDate> {
        (offset < self.days())
            .then(|| self.start.checked_add_days(Days::new(u64::from(offset))))
            .flatten()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Window bounds as a half-open range of wall-clock instants.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.start.and_time(NaiveTime::MIN),
            (self.end + Days::new(1)).and_time(NaiveTime::MIN),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSelection {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// An item dragged onto the grid from outside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraggedItem {
    pub title: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EventId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub mode: FormMode,
    pub title: String,
    pub category: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: Option<String>,
}

impl EditForm {
    pub fn for_slot(slot: SlotSelection) -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            category: String::new(),
            start: slot.start,
            end: slot.end,
            color: None,
        }
    }

    pub fn for_event(record: &EventRecord) -> Self {
        Self {
            mode: FormMode::Edit(record.id.clone()),
            title: record.title.clone(),
            category: record.category.clone(),
            start: record.start.naive_utc(),
            end: record.end.naive_utc(),
            color: record.color.clone(),
        }
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: Some(self.title.clone()),
            category: Some(self.category.clone()),
            start: Some(format_naive(self.start)),
            end: Some(format_naive(self.end)),
            color: self.color.clone(),
        }
    }
}

/// Read-only summary shown next to a selected event.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPopover {
    pub event_id: EventId,
    pub position: ScreenPoint,
    pub title: String,
    pub date_line: String,
    pub timing_line: String,
    pub category_line: String,
}

impl DetailPopover {
    pub fn for_event(record: &EventRecord, click: ScreenPoint) -> Self {
        let start = record.start.naive_utc();
        let end = record.end.naive_utc();
        let category = record.category.trim();
        Self {
            event_id: record.id.clone(),
            position: ScreenPoint::new(click.x + DETAILS_OFFSET_PX, click.y + DETAILS_OFFSET_PX),
            title: record.title.clone(),
            date_line: format!(
                "Date: {} {} {}",
                start.format("%B"),
                ordinal(start.day()),
                start.year()
            ),
            timing_line: format!(
                "Timing: {} - {}",
                start.format("%-I:%M %p"),
                end.format("%-I:%M %p")
            ),
            category_line: if category.is_empty() {
                "Category: No category mentioned".to_string()
            } else {
                format!("Category: {category}")
            },
        }
    }

    pub fn lines(&self) -> [&str; 4] {
        [
            self.title.as_str(),
            self.date_line.as_str(),
            self.timing_line.as_str(),
            self.category_line.as_str(),
        ]
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Overlay {
    #[default]
    Closed,
    Form(EditForm),
    Details(DetailPopover),
}

/// Compact grid label for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBadge {
    pub event_id: EventId,
    pub title: String,
    pub color: String,
    pub time_label: String,
}

impl From<&EventRecord> for EventBadge {
    fn from(record: &EventRecord) -> Self {
        Self {
            event_id: record.id.clone(),
            title: record.title.clone(),
            color: record.display_color().to_string(),
            time_label: record.start.naive_utc().format("%I:%M %p").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EventUpdated,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::EventUpdated => UPDATE_SUCCESS_NOTICE,
        }
    }
}

/// Fallbacks for items dropped from outside the grid.
pub const DEFAULT_DROP_TITLE: &str = "New Event";
pub const DEFAULT_DROP_CATEGORY: &str = "General";

impl DraggedItem {
    pub fn draft(&self, start: NaiveDateTime, end: NaiveDateTime) -> EventDraft {
        let pick = |value: &Option<String>, fallback: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        EventDraft {
            title: Some(pick(&self.title, DEFAULT_DROP_TITLE)),
            category: Some(pick(&self.category, DEFAULT_DROP_CATEGORY)),
            start: Some(format_naive(start)),
            end: Some(format_naive(end)),
            color: Some(pick(&self.color, DEFAULT_EVENT_COLOR)),
        }
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
