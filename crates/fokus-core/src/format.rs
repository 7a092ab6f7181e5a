//! Display helpers shared by the timer and the reports.

/// Format seconds as `MM:SS`.
///
/// There is no hours component: minutes wrap at 100, so `6000` renders as
/// `00:00`.
pub fn format_time(total_secs: u64) -> String {
    let minutes = (total_secs / 60) % 100;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Whole minutes, floored, with the unit suffix used in summaries.
pub fn format_minutes(total_secs: u64) -> String {
    format!("{} min", total_secs / 60)
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Seconds to minutes, one decimal.
pub fn secs_to_minutes(secs: u64) -> f64 {
    round1(secs as f64 / 60.0)
}
