//! Display formatting for metric values.

use super::metrics::MetricKind;

/// Width of the right-aligned numeric part of a field.
pub const VALUE_WIDTH: usize = 7;
/// Minimum width of the left-aligned unit suffix.
pub const UNIT_WIDTH: usize = 3;

/// Format a value for display.
///
/// Fans, frequencies, usages and temperatures are rounded to an integer; every
/// other kind is shown with exactly 3 decimals.
pub fn format_field(value: f64, unit: &str, kind: MetricKind) -> String {
    if kind.is_integral() && value.is_finite() {
        format!(
            "{:>vw$}{:<uw$}",
            value.round() as i64,
            unit,
            vw = VALUE_WIDTH,
            uw = UNIT_WIDTH
        )
    } else if kind.is_integral() {
        format!("{:>vw$}{:<uw$}", value, unit, vw = VALUE_WIDTH, uw = UNIT_WIDTH)
    } else {
        format!(
            "{:>vw$.3}{:<uw$}",
            value,
            unit,
            vw = VALUE_WIDTH,
            uw = UNIT_WIDTH
        )
    }
}

/// Placeholder shown for a series that has not produced a sample yet.
pub fn format_missing(unit: &str) -> String {
    format!("{:>vw$}{:<uw$}", "-", unit, vw = VALUE_WIDTH, uw = UNIT_WIDTH)
}
