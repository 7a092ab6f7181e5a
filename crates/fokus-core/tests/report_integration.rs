//! Integration tests for report aggregation.
//!
//! This test file verifies:
//! - Totals under the "All" and single-category filters
//! - The category breakdown ignores the filter
//! - Habit map day bucketing
//! - Heatmap selection refresh through ReportView

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use fokus_core::report::{habit_window, CategoryFilter, ReportAggregator, ReportView};
use fokus_core::{Config, FocusContext, MemoryStore, SessionLog, SessionRecord};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn aggregator() -> ReportAggregator {
    ReportAggregator::new(
        today(),
        FixedOffset::east_opt(0).unwrap(),
        Config::default().report.palette,
    )
}

fn session(id: i64, duration: u64, category: &str, days_ago: i64) -> SessionRecord {
    let day = today() - Duration::days(days_ago);
    SessionRecord {
        id,
        duration,
        category: category.to_string(),
        distractions: 0,
        pause_count: 0,
        date: Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap()),
    }
}

#[test]
fn test_two_category_summary() {
    let records = vec![session(1, 600, "A", 0), session(2, 300, "B", 1)];
    let report = aggregator().aggregate(&records, &CategoryFilter::All);

    assert_eq!(report.totals.total_secs, 900);
    assert_eq!(report.totals.today_secs, 600);
    let a = report.categories.iter().find(|c| c.name == "A").unwrap();
    let b = report.categories.iter().find(|c| c.name == "B").unwrap();
    assert_eq!(a.percentage, 66.7);
    assert_eq!(b.percentage, 33.3);
    assert_eq!(a.minutes, 10.0);
    assert_eq!(report.categories_available, vec!["All", "A", "B"]);
}

#[test]
fn test_breakdown_independent_of_filter() {
    let records = vec![session(1, 600, "A", 0), session(2, 300, "B", 1)];
    let agg = aggregator();
    let filtered = agg.aggregate(&records, &"A".parse().unwrap());

    assert_eq!(filtered.totals.total_secs, 600);
    assert_eq!(filtered.categories.len(), 2);
    assert_eq!(filtered.categories[0].percentage, 66.7);
}

#[test]
fn test_habit_map_single_key_per_day() {
    let records = vec![
        session(1, 60, "A", 3),
        session(2, 60, "A", 3),
        session(3, 60, "B", 100),
    ];
    let report = aggregator().aggregate(&records, &CategoryFilter::All);
    assert_eq!(report.habit.len(), 2);
    assert_eq!(report.habit[&(today() - Duration::days(3))], 2);

    // The aggregator keeps days outside any display window.
    assert!(report.habit.contains_key(&(today() - Duration::days(100))));
    let window = habit_window(&report.habit, today(), 95);
    assert_eq!(window.iter().map(|(_, c)| c).sum::<u32>(), 2);
}

#[test]
fn test_report_view_against_store() {
    let ctx = FocusContext::load(MemoryStore::new(), Config::default());
    let mut view = ReportView::new(aggregator());

    ctx.store().save_session(&session(1, 1500, "Coding", 0)).unwrap();
    view.reload(&ctx);
    view.select_day(today());
    assert_eq!(view.selection().unwrap().count, 1);

    ctx.store().save_session(&session(2, 900, "Reading", 0)).unwrap();
    view.reload(&ctx);
    assert_eq!(view.selection().unwrap().count, 2);

    view.set_filter(CategoryFilter::Only("Coding".into()));
    assert_eq!(view.selection().unwrap().count, 1);
    assert_eq!(view.report().totals.total_secs, 1500);

    assert!(ctx.clear_sessions());
    view.reload(&ctx);
    assert_eq!(view.selection().unwrap().count, 0);
    assert_eq!(view.report().totals.total_secs, 0);
}
