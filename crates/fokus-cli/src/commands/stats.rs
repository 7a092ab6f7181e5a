use chrono::NaiveDate;
use clap::{Args, Subcommand};
use fokus_core::report::habit_window;
use fokus_core::storage::MAX_HEATMAP_DAYS;
use fokus_core::{format_minutes, CategoryFilter, ReportAggregator, ReportView};
use serde_json::json;

use super::{open_context, print_json, CliResult};

#[derive(Args)]
pub struct FilterArgs {
    /// Restrict to one category ("All" for everything)
    #[arg(long, default_value = CategoryFilter::ALL_LABEL)]
    category: CategoryFilter,
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time and today totals
    Summary(FilterArgs),
    /// Minutes per day over the last 7 days
    Daily(FilterArgs),
    /// Sessions per day over the heatmap window
    Heatmap {
        #[command(flatten)]
        filter: FilterArgs,
        /// Days to show (defaults to report.heatmap_days)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HEATMAP_DAYS)))]
        days: Option<u32>,
        /// Print the session count of a single day (YYYY-MM-DD)
        #[arg(long)]
        select: Option<NaiveDate>,
    },
    /// Share of recorded time per category, unaffected by any filter
    Categories,
}

pub fn run(action: StatsAction) -> CliResult {
    let ctx = open_context()?;
    let aggregator = ReportAggregator::now(ctx.config().report.palette.clone());
    let today = aggregator.today();
    let mut view = ReportView::new(aggregator);
    view.reload(&ctx);

    match action {
        StatsAction::Summary(args) => {
            let report = view.set_filter(args.category);
            let totals = &report.totals;
            print_json(&json!({
                "filter": report.filter,
                "total": format_minutes(totals.total_secs),
                "today": format_minutes(totals.today_secs),
                "totals": totals,
                "categories_available": report.categories_available,
            }))?;
        }
        StatsAction::Daily(args) => {
            let report = view.set_filter(args.category);
            print_json(&json!({ "filter": report.filter, "daily": report.daily }))?;
        }
        StatsAction::Heatmap {
            filter,
            days,
            select,
        } => {
            view.set_filter(filter.category);
            if let Some(date) = select {
                print_json(&view.select_day(date))?;
                return Ok(());
            }
            let report = view.report();
            let days = days.unwrap_or(ctx.config().report.heatmap_days);
            let cells: Vec<_> = habit_window(&report.habit, today, days)
                .into_iter()
                .map(|(date, count)| json!({ "date": date, "count": count }))
                .collect();
            print_json(&json!({ "filter": report.filter, "days": cells }))?;
        }
        StatsAction::Categories => print_json(&view.report().categories)?,
    }
    Ok(())
}
