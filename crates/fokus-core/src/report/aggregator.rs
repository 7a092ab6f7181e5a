//! Session history aggregation.
//!
//! [`ReportAggregator::aggregate`] is a pure function of the record list and
//! the category filter. The category breakdown always covers the whole
//! history: under a single-category filter it would trivially be 100% of
//! that one category.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, Duration, FixedOffset, Local, NaiveDate};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::format::{round1, secs_to_minutes};
use crate::timer::SessionRecord;

/// Number of bars in the daily series.
pub const DAILY_WINDOW_DAYS: i64 = 7;

/// Color for categories when the palette is empty.
const FALLBACK_COLOR: &str = "#9CA3AF";

/// Which records the filtered figures cover.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub const ALL_LABEL: &'static str = "All";

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => Self::ALL_LABEL,
            CategoryFilter::Only(c) => c,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "All" | "all" => CategoryFilter::All,
            other => CategoryFilter::Only(other.to_string()),
        })
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Summary figures over the filtered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_secs: u64,
    pub today_secs: u64,
    pub distractions: u64,
    pub pauses: u64,
    pub sessions: usize,
}

/// One bar of the 7-day chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    /// Short weekday name.
    pub label: String,
    pub minutes: f64,
}

/// Sparse calendar day -> number of sessions.
pub type HabitMap = BTreeMap<NaiveDate, u32>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub name: String,
    pub duration_secs: u64,
    pub minutes: f64,
    /// Share of all recorded time, one decimal.
    pub percentage: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub filter: CategoryFilter,
    pub totals: Totals,
    pub daily: Vec<DailyBar>,
    pub habit: HabitMap,
    pub categories: Vec<CategoryShare>,
    /// Filter choices: "All" followed by every category in first-seen order.
    pub categories_available: Vec<String>,
}

/// Time zone used to put completion timestamps on calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayZone {
    Fixed(FixedOffset),
    Local,
}

/// Turns the session history into report figures for a given day.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    today: NaiveDate,
    zone: DayZone,
    palette: Vec<String>,
}

impl ReportAggregator {
    /// `offset` decides which calendar day a completion timestamp falls on.
    pub fn new(today: NaiveDate, offset: FixedOffset, palette: Vec<String>) -> Self {
        Self {
            today,
            zone: DayZone::Fixed(offset),
            palette,
        }
    }

    /// Aggregator for the local calendar day.
    pub fn now(palette: Vec<String>) -> Self {
        Self {
            today: Local::now().date_naive(),
            zone: DayZone::Local,
            palette,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn day_of(&self, record: &SessionRecord) -> NaiveDate {
        match self.zone {
            DayZone::Fixed(offset) => record.date.with_timezone(&offset).date_naive(),
            // Each record uses the offset in force when it was made.
            DayZone::Local => record.date.with_timezone(&Local).date_naive(),
        }
    }

    pub fn aggregate(&self, records: &[SessionRecord], filter: &CategoryFilter) -> Report {
        let filtered: Vec<&SessionRecord> = records
            .iter()
            .filter(|r| filter.matches(&r.category))
            .collect();

        Report {
            filter: filter.clone(),
            totals: self.totals(&filtered),
            daily: self.daily_series(&filtered),
            habit: self.habit_map(&filtered),
            categories: self.category_breakdown(records),
            categories_available: categories_available(records),
        }
    }

    pub fn totals(&self, records: &[&SessionRecord]) -> Totals {
        let mut totals = Totals {
            sessions: records.len(),
            ..Totals::default()
        };
        for r in records {
            totals.total_secs += r.duration;
            totals.distractions += u64::from(r.distractions);
            totals.pauses += u64::from(r.pause_count);
            if self.day_of(r) == self.today {
                totals.today_secs += r.duration;
            }
        }
        totals
    }

    /// Minutes per day for the last seven days, oldest first, today last.
    pub fn daily_series(&self, records: &[&SessionRecord]) -> Vec<DailyBar> {
        let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for r in records {
            *per_day.entry(self.day_of(r)).or_default() += r.duration;
        }

        (0..DAILY_WINDOW_DAYS)
            .rev()
            .map(|back| {
                let date = self.today - Duration::days(back);
                DailyBar {
                    date,
                    label: date.format("%a").to_string(),
                    minutes: secs_to_minutes(per_day.get(&date).copied().unwrap_or(0)),
                }
            })
            .collect()
    }

    /// Session count for every day that has at least one session.
    pub fn habit_map(&self, records: &[&SessionRecord]) -> HabitMap {
        let mut habit = HabitMap::new();
        for r in records {
            *habit.entry(self.day_of(r)).or_default() += 1;
        }
        habit
    }

    /// Per-category time over the whole history, largest first.
    ///
    /// Colors follow first-seen order, so a category keeps its color when
    /// the sort order changes.
    pub fn category_breakdown(&self, records: &[SessionRecord]) -> Vec<CategoryShare> {
        let mut per_category: IndexMap<&str, u64> = IndexMap::new();
        for r in records {
            *per_category.entry(r.category.as_str()).or_default() += r.duration;
        }
        let grand_total: u64 = per_category.values().sum();

        let mut shares: Vec<CategoryShare> = per_category
            .iter()
            .enumerate()
            .map(|(index, (name, &duration_secs))| CategoryShare {
                name: (*name).to_string(),
                duration_secs,
                minutes: secs_to_minutes(duration_secs),
                percentage: if grand_total > 0 {
                    round1(duration_secs as f64 / grand_total as f64 * 100.0)
                } else {
                    0.0
                },
                color: self.color(index),
            })
            .collect();
        shares.sort_by(|a, b| b.duration_secs.cmp(&a.duration_secs));
        shares
    }

    fn color(&self, index: usize) -> String {
        if self.palette.is_empty() {
            return FALLBACK_COLOR.to_string();
        }
        self.palette[index % self.palette.len()].clone()
    }
}

fn categories_available(records: &[SessionRecord]) -> Vec<String> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for r in records {
        seen.entry(r.category.as_str()).or_insert(());
    }
    std::iter::once(CategoryFilter::ALL_LABEL.to_string())
        .chain(seen.keys().map(|c| (*c).to_string()))
        .collect()
}

/// The rolling heatmap window ending at `end`, oldest first, zero-filled.
///
/// The window stops at the earliest representable date.
pub fn habit_window(habit: &HabitMap, end: NaiveDate, days: u32) -> Vec<(NaiveDate, u32)> {
    let mut window: Vec<_> = (0..u64::from(days))
        .map_while(|back| end.checked_sub_days(Days::new(back)))
        .map(|date| (date, habit.get(&date).copied().unwrap_or(0)))
        .collect();
    window.reverse();
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn palette() -> Vec<String> {
        ["#F87171", "#FBBF24", "#34D399"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn aggregator() -> ReportAggregator {
        ReportAggregator::new(today(), FixedOffset::east_opt(0).unwrap(), palette())
    }

    fn record(id: i64, duration: u64, category: &str, day: NaiveDate, hour: u32) -> SessionRecord {
        SessionRecord {
            id,
            duration,
            category: category.into(),
            distractions: 1,
            pause_count: 2,
            date: Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).unwrap()),
        }
    }

    fn yesterday() -> NaiveDate {
        today() - Duration::days(1)
    }

    #[test]
    fn empty_history() {
        let report = aggregator().aggregate(&[], &CategoryFilter::All);
        assert_eq!(report.totals, Totals::default());
        assert_eq!(report.daily.len(), 7);
        assert!(report.daily.iter().all(|d| d.minutes == 0.0));
        assert!(report.habit.is_empty());
        assert!(report.categories.is_empty());
        assert_eq!(report.categories_available, vec!["All"]);
    }

    #[test]
    fn totals_and_breakdown() {
        let records = vec![
            record(1, 600, "A", today(), 9),
            record(2, 300, "B", yesterday(), 9),
        ];
        let report = aggregator().aggregate(&records, &CategoryFilter::All);
        assert_eq!(report.totals.total_secs, 900);
        assert_eq!(report.totals.today_secs, 600);
        assert_eq!(report.totals.distractions, 2);
        assert_eq!(report.totals.pauses, 4);
        assert_eq!(report.categories[0].name, "A");
        assert_eq!(report.categories[0].percentage, 66.7);
        assert_eq!(report.categories[1].percentage, 33.3);
    }

    #[test]
    fn breakdown_ignores_filter() {
        let records = vec![
            record(1, 600, "A", today(), 9),
            record(2, 300, "B", yesterday(), 9),
        ];
        let agg = aggregator();
        let all = agg.aggregate(&records, &CategoryFilter::All);
        let only_b = agg.aggregate(&records, &CategoryFilter::Only("B".into()));
        assert_eq!(all.categories, only_b.categories);
        assert_eq!(only_b.totals.total_secs, 300);
        assert_eq!(only_b.totals.today_secs, 0);
    }

    #[test]
    fn daily_series_is_oldest_first_and_fixed_length() {
        let records = vec![
            record(1, 90, "A", today(), 9),
            record(2, 30, "A", today(), 10),
            record(3, 600, "A", today() - Duration::days(6), 9),
            record(4, 600, "A", today() - Duration::days(7), 9),
        ];
        let report = aggregator().aggregate(&records, &CategoryFilter::All);
        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.daily[0].date, today() - Duration::days(6));
        assert_eq!(report.daily[0].minutes, 10.0);
        assert_eq!(report.daily[6].date, today());
        assert_eq!(report.daily[6].minutes, 2.0);
        assert_eq!(report.daily[6].label, "Sun");
    }

    #[test]
    fn habit_map_counts_sessions_not_time() {
        let records = vec![
            record(1, 60, "A", today(), 9),
            record(2, 6000, "A", today(), 15),
            record(3, 60, "B", yesterday(), 9),
        ];
        let report = aggregator().aggregate(&records, &CategoryFilter::All);
        assert_eq!(report.habit.len(), 2);
        assert_eq!(report.habit[&today()], 2);
        assert_eq!(report.habit[&yesterday()], 1);
    }

    #[test]
    fn offset_moves_late_sessions_to_next_day() {
        let late = record(1, 60, "A", yesterday(), 23);
        let plus_two = ReportAggregator::new(
            today(),
            FixedOffset::east_opt(2 * 3600).unwrap(),
            palette(),
        );
        assert_eq!(plus_two.day_of(&late), today());
        assert_eq!(aggregator().day_of(&late), yesterday());
    }

    #[test]
    fn local_clock_uses_each_records_own_offset() {
        let agg = ReportAggregator::now(palette());
        // Late evening in winter and in summer: with daylight saving the
        // local offsets differ, and each record must keep its own.
        for (month, hour) in [(1, 23), (7, 23), (1, 0), (7, 0)] {
            let date = NaiveDate::from_ymd_opt(2026, month, 15).unwrap();
            let r = record(1, 60, "A", date, hour);
            assert_eq!(agg.day_of(&r), r.date.with_timezone(&Local).date_naive());
        }
    }

    #[test]
    fn colors_follow_first_seen_order_and_wrap() {
        let records = vec![
            record(1, 10, "A", today(), 9),
            record(2, 20, "B", today(), 9),
            record(3, 30, "C", today(), 9),
            record(4, 40, "D", today(), 9),
        ];
        let shares = aggregator().category_breakdown(&records);
        let by_name = |n: &str| shares.iter().find(|s| s.name == n).unwrap().color.clone();
        assert_eq!(by_name("A"), "#F87171");
        assert_eq!(by_name("C"), "#34D399");
        assert_eq!(by_name("D"), "#F87171");
        assert_eq!(shares[0].name, "D");
    }

    #[test]
    fn empty_palette_uses_fallback_color() {
        let agg = ReportAggregator::new(today(), FixedOffset::east_opt(0).unwrap(), Vec::new());
        let shares = agg.category_breakdown(&[record(1, 10, "A", today(), 9)]);
        assert_eq!(shares[0].color, FALLBACK_COLOR);
        assert_eq!(shares[0].percentage, 100.0);
    }

    #[test]
    fn zero_duration_history_has_zero_percentages() {
        let shares = aggregator().category_breakdown(&[record(1, 0, "A", today(), 9)]);
        assert_eq!(shares[0].percentage, 0.0);
    }

    #[test]
    fn same_input_same_output() {
        let records = vec![
            record(1, 600, "A", today(), 9),
            record(2, 300, "B", yesterday(), 9),
        ];
        let agg = aggregator();
        let filter = CategoryFilter::Only("A".into());
        assert_eq!(agg.aggregate(&records, &filter), agg.aggregate(&records, &filter));
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Coding".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only("Coding".into())
        );
        assert_eq!(CategoryFilter::Only("Coding".into()).to_string(), "Coding");
    }

    #[test]
    fn window_is_zero_filled() {
        let mut habit = HabitMap::new();
        habit.insert(today(), 3);
        let window = habit_window(&habit, today(), 95);
        assert_eq!(window.len(), 95);
        assert_eq!(window[94], (today(), 3));
        assert_eq!(window[0], (today() - Duration::days(94), 0));
    }

    #[test]
    fn window_stops_at_earliest_date() {
        let end = NaiveDate::MIN.checked_add_days(Days::new(2)).unwrap();
        let window = habit_window(&HabitMap::new(), end, 10);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].0, NaiveDate::MIN);
        assert_eq!(window[2].0, end);
    }

    #[test]
    fn huge_window_does_not_panic() {
        let window = habit_window(&HabitMap::new(), NaiveDate::MIN, u32::MAX);
        assert_eq!(window, vec![(NaiveDate::MIN, 0)]);
    }
}
