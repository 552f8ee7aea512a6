use super::*;
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).expect("time")
}

fn time_grid() -> GridGeometry {
    GridGeometry {
        top: 100.0,
        left: 0.0,
        column_width: 100.0,
        ..GridGeometry::default()
    }
}

#[test]
fn default_ratio_is_point_six_minutes_per_pixel() {
    assert!((GridGeometry::default().minutes_per_pixel() - 0.6).abs() < f64::EPSILON);
}

#[test]
fn week_drop_snaps_to_column_and_rounds_minutes() {
    let window = ViewMode::Week.window_for(date(2024, 1, 3));
    let range = drop_range(ViewMode::Week, &window, &time_grid(), ScreenPoint::new(250.0, 250.0));
    assert_eq!(
        range,
        Some((at(date(2024, 1, 2), 1, 30), at(date(2024, 1, 2), 2, 0)))
    );
}

#[test]
fn day_drop_ignores_points_past_the_single_column() {
    let window = ViewMode::Day.window_for(date(2024, 1, 3));
    let grid = time_grid();
    assert_eq!(
        drop_start(ViewMode::Day, &window, &grid, ScreenPoint::new(50.0, 160.0)),
        Some(at(date(2024, 1, 3), 0, 36))
    );
    assert_eq!(
        drop_start(ViewMode::Day, &window, &grid, ScreenPoint::new(150.0, 160.0)),
        None
    );
}

#[test]
fn drops_above_or_left_of_the_grid_are_ignored() {
    let window = ViewMode::Week.window_for(date(2024, 1, 3));
    let grid = time_grid();
    assert_eq!(drop_start(ViewMode::Week, &window, &grid, ScreenPoint::new(10.0, 99.0)), None);
    assert_eq!(drop_start(ViewMode::Week, &window, &grid, ScreenPoint::new(-1.0, 200.0)), None);
}

#[test]
fn late_drops_are_clamped_so_the_event_ends_by_midnight() {
    let window = ViewMode::Week.window_for(date(2024, 1, 3));
    let range = drop_range(ViewMode::Week, &window, &time_grid(), ScreenPoint::new(0.0, 100.0 + 5000.0));
    assert_eq!(
        range,
        Some((at(date(2023, 12, 31), 23, 30), at(date(2024, 1, 1), 0, 0)))
    );
}

#[test]
fn month_drop_lands_at_midnight_of_the_cell_day() {
    let window = ViewMode::Month.window_for(date(2024, 1, 15));
    let grid = GridGeometry {
        top: 0.0,
        left: 0.0,
        column_width: 100.0,
        row_height: 100.0,
        ..GridGeometry::default()
    };
    assert_eq!(
        drop_start(ViewMode::Month, &window, &grid, ScreenPoint::new(350.0, 150.0)),
        Some(at(date(2024, 1, 10), 0, 0))
    );
    assert_eq!(
        drop_start(ViewMode::Month, &window, &grid, ScreenPoint::new(750.0, 150.0)),
        None
    );
    assert_eq!(
        drop_start(ViewMode::Month, &window, &grid, ScreenPoint::new(50.0, 550.0)),
        None
    );
}

#[test]
fn non_finite_coordinates_are_outside_the_grid() {
    let window = ViewMode::Week.window_for(date(2024, 1, 3));
    let grid = time_grid();
    for point in [
        ScreenPoint::new(f64::NAN, 200.0),
        ScreenPoint::new(50.0, f64::NAN),
        ScreenPoint::new(f64::INFINITY, 200.0),
        ScreenPoint::new(50.0, f64::INFINITY),
    ] {
        assert_eq!(drop_start(ViewMode::Week, &window, &grid, point), None);
        assert_eq!(drop_start(ViewMode::Month, &window, &grid, point), None);
    }
}
