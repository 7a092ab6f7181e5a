//! Reporting over the session history: summary totals, the 7-day series,
//! the habit heatmap and the category breakdown.

mod aggregator;
mod view;

pub use aggregator::{
    habit_window, CategoryFilter, CategoryShare, DailyBar, HabitMap, Report, ReportAggregator,
    Totals, DAILY_WINDOW_DAYS,
};
pub use view::{HeatmapSelection, ReportView};
