//! Presentation boundary.
//!
//! The core never touches a rendering target. It hands plain data to a [`Presenter`]:
//! the ordered lists, the dashboard aggregate, both chart series, and user notices.
//! [`ConsolePresenter`] is a text rendition used by the shell binary.

use crate::core::aggregation::{ChartSeries, DashboardSummary};
use crate::core::format::{due_day_label, format_date, format_inr};
use crate::store::{CollectionRecord, EmiRecord};
use std::fmt;

/// How a notice should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral information
    Info,
    /// A command completed
    Success,
    /// A command failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Consumer of everything the core produces for display.
pub trait Presenter: Send + Sync {
    /// Renders the collection list, most recent first.
    fn render_collections(&self, collections: &[CollectionRecord]);
    /// Renders the EMI list in arrival order.
    fn render_emis(&self, emis: &[EmiRecord]);
    /// Renders the dashboard figures.
    fn render_dashboard(&self, summary: &DashboardSummary);
    /// Renders the "Collections vs EMI" and "Profit split" charts.
    fn render_charts(&self, collections_vs_emi: &ChartSeries, profit_split: &ChartSeries);
    /// Shows a transient notice.
    fn notify(&self, message: &str, severity: Severity);
}

/// Text lines for the collection table and its summary.
#[must_use]
pub fn collection_lines(collections: &[CollectionRecord]) -> Vec<String> {
    if collections.is_empty() {
        return vec!["No collections yet".to_string()];
    }
    let summary = crate::core::aggregation::summarize_collections(collections);
    let mut lines: Vec<String> = collections
        .iter()
        .map(|c| format!("#{:<5} {}  {}", c.id, format_date(c.date), format_inr(c.amount)))
        .collect();
    lines.push(format!(
        "Total {}  Profit {}",
        format_inr(summary.total),
        format_inr(summary.profit)
    ));
    lines
}

/// Text lines for the EMI table and its summary.
#[must_use]
pub fn emi_lines(emis: &[EmiRecord]) -> Vec<String> {
    if emis.is_empty() {
        return vec!["No EMI records yet".to_string()];
    }
    let summary = crate::core::aggregation::summarize_emis(emis);
    let mut lines: Vec<String> = emis
        .iter()
        .map(|e| {
            format!(
                "#{:<5} {}  {}  {}  {}",
                e.id,
                e.name,
                format_inr(e.amount),
                due_day_label(e.due_day),
                if e.is_paid_this_month { "Paid" } else { "Pending" }
            )
        })
        .collect();
    lines.push(format!(
        "Pending {}  Completed {}  Pending count {}",
        format_inr(summary.pending_total),
        summary.completed_count,
        summary.pending_count
    ));
    lines
}

/// Text lines for the dashboard cards.
#[must_use]
pub fn dashboard_lines(summary: &DashboardSummary) -> Vec<String> {
    vec![
        format!("Dashboard {:02}/{}", summary.month, summary.year),
        format!("  Total collection  {}", format_inr(summary.monthly_collection_total)),
        format!("  Monthly profit    {}", format_inr(summary.monthly_profit)),
        format!("  Pending EMI       {}", format_inr(summary.pending_emi_total)),
        format!("  Net balance       {}", format_inr(summary.net_balance)),
    ]
}

/// One text line for a chart series.
#[must_use]
pub fn chart_line(series: &ChartSeries) -> String {
    format!(
        "{}: {} {} | {} {}",
        series.title,
        series.labels[0],
        format_inr(series.values[0]),
        series.labels[1],
        format_inr(series.values[1])
    )
}

/// Presenter that prints plain text to stdout.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl ConsolePresenter {
    fn print(lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

impl Presenter for ConsolePresenter {
    fn render_collections(&self, collections: &[CollectionRecord]) {
        println!("-- Collections --");
        Self::print(&collection_lines(collections));
    }

    fn render_emis(&self, emis: &[EmiRecord]) {
        println!("-- EMIs --");
        Self::print(&emi_lines(emis));
    }

    fn render_dashboard(&self, summary: &DashboardSummary) {
        Self::print(&dashboard_lines(summary));
    }

    fn render_charts(&self, collections_vs_emi: &ChartSeries, profit_split: &ChartSeries) {
        println!("{}", chart_line(collections_vs_emi));
        println!("{}", chart_line(profit_split));
    }

    fn notify(&self, message: &str, severity: Severity) {
        let time = chrono::Local::now().format("%H:%M");
        println!("[{severity} {time}] {message}");
    }
}
