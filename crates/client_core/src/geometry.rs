//! Maps a drop point on the rendered grid to a calendar time range.
//!
//! Time-grid views (day, week) lay days out as columns and time vertically,
//! `slot_minutes` per `slot_height_px`. With the defaults that is 0.6 minutes
//! per pixel. The month view lays days out as a 7-column grid of week rows and
//! a drop lands at midnight of the cell's day.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::types::{DateWindow, ScreenPoint, ViewMode};

pub const SLOT_HEIGHT_PX: f64 = 50.0;
pub const SLOT_MINUTES: u32 = 30;
pub const DEFAULT_DROP_DURATION_MINUTES: i64 = 30;
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Placement of the grid's time content on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub top: f64,
    pub left: f64,
    pub column_width: f64,
    pub slot_height_px: f64,
    pub slot_minutes: u32,
    /// Height of one week row in the month view.
    pub row_height: f64,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            column_width: 120.0,
            slot_height_px: SLOT_HEIGHT_PX,
            slot_minutes: SLOT_MINUTES,
            row_height: 100.0,
        }
    }
}

impl GridGeometry {
    pub fn minutes_per_pixel(&self) -> f64 {
        f64::from(self.slot_minutes) / self.slot_height_px
    }
}

/// Start of the event a drop at `point` creates, or `None` when the point
/// falls outside the grid.
pub fn drop_start(
    view: ViewMode,
    window: &DateWindow,
    geometry: &GridGeometry,
    point: ScreenPoint,
) -> Option<NaiveDateTime> {
    let dx = point.x - geometry.left;
    let dy = point.y - geometry.top;
    if !dx.is_finite()
        || !dy.is_finite()
        || dx < 0.0
        || dy < 0.0
        || geometry.column_width <= 0.0
    {
        return None;
    }
    let column = (dx / geometry.column_width).floor() as u32;

    match view {
        ViewMode::Day | ViewMode::Week => {
            if geometry.slot_height_px <= 0.0 {
                return None;
            }
            let day = window.day(column)?;
            let latest_start = MINUTES_PER_DAY - DEFAULT_DROP_DURATION_MINUTES;
            let minutes = ((dy * geometry.minutes_per_pixel()).round() as i64).clamp(0, latest_start);
            Some(day.and_time(NaiveTime::MIN) + Duration::minutes(minutes))
        }
        ViewMode::Month => {
            if column >= 7 || geometry.row_height <= 0.0 {
                return None;
            }
            let row = (dy / geometry.row_height).floor() as u32;
            let day = window.day(row * 7 + column)?;
            Some(day.and_time(NaiveTime::MIN))
        }
    }
}

/// Start and end of the event created by a drop, using the default duration.
pub fn drop_range(
    view: ViewMode,
    window: &DateWindow,
    geometry: &GridGeometry,
    point: ScreenPoint,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = drop_start(view, window, geometry, point)?;
    Some((start, start + Duration::minutes(DEFAULT_DROP_DURATION_MINUTES)))
}

#[cfg(test)]
#[path = "tests/geometry_tests.rs"]
mod tests;
