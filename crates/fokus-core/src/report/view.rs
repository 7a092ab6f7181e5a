use chrono::NaiveDate;
use serde::Serialize;

use super::aggregator::{CategoryFilter, HabitMap, Report, ReportAggregator};
use crate::settings::FocusContext;
use crate::storage::KvStore;
use crate::timer::SessionRecord;

/// A heatmap day the user tapped, with its session count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapSelection {
    pub date: NaiveDate,
    pub count: u32,
}

impl HeatmapSelection {
    pub fn from_habit(date: NaiveDate, habit: &HabitMap) -> Self {
        Self {
            date,
            count: habit.get(&date).copied().unwrap_or(0),
        }
    }
}

/// Report screen state: loaded history, active filter, current report and
/// the selected heatmap day.
///
/// The selection is re-counted against every newly computed report, so a
/// filter switch never leaves a stale count on screen.
#[derive(Debug, Clone)]
pub struct ReportView {
    aggregator: ReportAggregator,
    records: Vec<SessionRecord>,
    filter: CategoryFilter,
    report: Report,
    selection: Option<HeatmapSelection>,
}

impl ReportView {
    pub fn new(aggregator: ReportAggregator) -> Self {
        let report = aggregator.aggregate(&[], &CategoryFilter::All);
        Self {
            aggregator,
            records: Vec::new(),
            filter: CategoryFilter::All,
            report,
            selection: None,
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn selection(&self) -> Option<HeatmapSelection> {
        self.selection
    }

    /// Replace the history and recompute.
    pub fn load(&mut self, records: Vec<SessionRecord>) -> &Report {
        self.records = records;
        self.recompute();
        &self.report
    }

    /// Re-read the history from the store. On a read failure the previously
    /// loaded history stays in place.
    pub fn reload<S: KvStore>(&mut self, ctx: &FocusContext<S>) -> &Report {
        match ctx.try_sessions() {
            Ok(records) => self.records = records,
            Err(e) => tracing::warn!(error = %e, "keeping previously loaded sessions"),
        }
        self.recompute();
        &self.report
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) -> &Report {
        self.filter = filter;
        self.recompute();
        &self.report
    }

    pub fn select_day(&mut self, date: NaiveDate) -> HeatmapSelection {
        let selection = HeatmapSelection::from_habit(date, &self.report.habit);
        self.selection = Some(selection);
        selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn recompute(&mut self) {
        self.report = self.aggregator.aggregate(&self.records, &self.filter);
        if let Some(selection) = self.selection {
            self.selection = Some(HeatmapSelection::from_habit(
                selection.date,
                &self.report.habit,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Config, MemoryStore, SessionLog};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn view() -> ReportView {
        ReportView::new(ReportAggregator::new(
            today(),
            FixedOffset::east_opt(0).unwrap(),
            vec!["#F87171".into()],
        ))
    }

    fn record(id: i64, category: &str) -> SessionRecord {
        SessionRecord {
            id,
            duration: 600,
            category: category.into(),
            distractions: 0,
            pause_count: 0,
            date: Utc.from_utc_datetime(&today().and_hms_opt(9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn selection_refreshes_on_filter_switch() {
        let mut view = view();
        view.load(vec![record(1, "A"), record(2, "A"), record(3, "B")]);
        assert_eq!(view.select_day(today()).count, 3);

        view.set_filter(CategoryFilter::Only("A".into()));
        assert_eq!(view.selection().unwrap().count, 2);

        view.set_filter(CategoryFilter::Only("C".into()));
        assert_eq!(
            view.selection(),
            Some(HeatmapSelection {
                date: today(),
                count: 0
            })
        );
    }

    #[test]
    fn selecting_an_empty_day_counts_zero() {
        let mut view = view();
        view.load(vec![record(1, "A")]);
        let empty_day = today().pred_opt().unwrap();
        assert_eq!(view.select_day(empty_day).count, 0);
        view.clear_selection();
        assert!(view.selection().is_none());
    }

    #[test]
    fn reload_reads_from_context() {
        let ctx = crate::settings::FocusContext::load(MemoryStore::new(), Config::default());
        ctx.store().save_session(&record(1, "A")).unwrap();
        let mut view = view();
        let report = view.reload(&ctx);
        assert_eq!(report.totals.total_secs, 600);
        assert_eq!(view.records().len(), 1);
    }
}
