//! Timeline geometry and time utilities.
//!
//! Pure functions converting between hour offsets and pixel coordinates,
//! snapping continuous displacement to the integer-hour grid, mapping
//! vertical displacement to line rows, and anchoring hour offsets to
//! calendar time. No state.

use chrono::NaiveDateTime;

use crate::models::DEFAULT_ANCHOR;

/// Format of the `planning_anchor` config field.
pub const ANCHOR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pixels per hour when fitting `horizon_hours` into `viewport_px`.
///
/// Returns 0.0 for a non-positive horizon; callers treat that as an
/// unrenderable (zero-width) timeline.
pub fn px_per_hour(viewport_px: f64, horizon_hours: i64) -> f64 {
    if horizon_hours <= 0 {
        return 0.0;
    }
    viewport_px / horizon_hours as f64
}

/// X coordinate of an hour offset.
#[inline]
pub fn hour_to_px(hour: i64, px_per_hour: f64) -> f64 {
    hour as f64 * px_per_hour
}

/// Nearest integer hour for an X coordinate.
pub fn snap_px_to_hour(px: f64, px_per_hour: f64) -> i64 {
    if px_per_hour <= 0.0 {
        return 0;
    }
    (px / px_per_hour).round() as i64
}

/// Horizontal displacement snapped to a whole-hour delta.
#[inline]
pub fn snap_delta_hours(dx_px: f64, px_per_hour: f64) -> i64 {
    snap_px_to_hour(dx_px, px_per_hour)
}

/// Vertical displacement rounded to whole line-rows (may be negative).
pub fn row_offset(dy_px: f64, row_height: f64) -> i64 {
    if row_height <= 0.0 {
        return 0;
    }
    (dy_px / row_height).round() as i64
}

/// Clamps a (possibly negative) line index into `0..line_count`.
///
/// Returns `None` when there are no lines at all.
pub fn clamp_line_index(index: i64, line_count: usize) -> Option<usize> {
    if line_count == 0 {
        return None;
    }
    Some(index.clamp(0, line_count as i64 - 1) as usize)
}

/// Parses a planning anchor timestamp, falling back to the default
/// anchor when the host's value does not parse.
pub fn parse_anchor(anchor: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(anchor, ANCHOR_FORMAT).unwrap_or_else(|_| {
        NaiveDateTime::parse_from_str(DEFAULT_ANCHOR, ANCHOR_FORMAT)
            .unwrap_or_else(|_| NaiveDateTime::default())
    })
}

/// Calendar timestamp of an hour offset relative to the anchor.
pub fn hour_to_timestamp(anchor: NaiveDateTime, hour: i64) -> NaiveDateTime {
    anchor + chrono::Duration::hours(hour)
}
