//! Dashboard aggregation - derives the figures shown on the dashboard and charts.
//!
//! Every function here is a pure computation over the current in-memory lists. Nothing is
//! cached: the sync engine calls [`DashboardSummary::compute`] after every snapshot and
//! each call rescans both lists in full.

use crate::store::{CollectionRecord, EmiRecord};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Share of collections counted as profit.
pub const PROFIT_MARGIN: f64 = 0.30;
/// Share of collections counted as cost.
pub const COST_SHARE: f64 = 0.70;

/// Totals for the full collection list, shown under the collections table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CollectionSummary {
    /// Number of records in the list
    pub count: usize,
    /// Sum of every amount in the list, across all months
    pub total: f64,
    /// `total` x [`PROFIT_MARGIN`]
    pub profit: f64,
}

/// Paid/pending breakdown of the EMI list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EmiSummary {
    /// Sum of amounts not yet paid this cycle
    pub pending_total: f64,
    /// EMIs marked paid this cycle
    pub completed_count: usize,
    /// EMIs still pending this cycle
    pub pending_count: usize,
}

/// All derived values for one dashboard render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Calendar month (1-12) the monthly figures refer to
    pub month: u32,
    /// Calendar year the monthly figures refer to
    pub year: i32,
    /// Collections recorded in the current month
    pub monthly_collection_total: f64,
    /// Profit share of the monthly total
    pub monthly_profit: f64,
    /// Sum of unpaid EMI amounts
    pub pending_emi_total: f64,
    /// Monthly collections minus pending EMIs; may be negative
    pub net_balance: f64,
    /// EMI list breakdown
    pub emis: EmiSummary,
    /// Whole collection list totals
    pub collections: CollectionSummary,
}

/// A two-bar (or two-slice) chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Chart title
    pub title: &'static str,
    /// One label per value
    pub labels: [&'static str; 2],
    /// Series values
    pub values: [f64; 2],
}

/// Both dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    /// `[monthly collection total, pending EMI total]`
    pub collections_vs_emi: ChartSeries,
    /// `[monthly profit, monthly cost share]`
    pub profit_split: ChartSeries,
}

/// Sum of collection amounts whose stored month/year match `today`.
#[must_use]
pub fn monthly_collection_total(collections: &[CollectionRecord], today: NaiveDate) -> f64 {
    let month = today.month();
    let year = today.year();
    collections
        .iter()
        .filter(|c| u32::try_from(c.month).is_ok_and(|m| m == month) && c.year == year)
        .map(|c| c.amount)
        .sum()
}

/// Profit share of a collection total.
#[must_use]
pub fn profit_of(total: f64) -> f64 {
    total * PROFIT_MARGIN
}

/// Cost share of a collection total.
#[must_use]
pub fn cost_of(total: f64) -> f64 {
    total * COST_SHARE
}

/// Totals over the whole collection list.
#[must_use]
pub fn summarize_collections(collections: &[CollectionRecord]) -> CollectionSummary {
    let total: f64 = collections.iter().map(|c| c.amount).sum();
    CollectionSummary {
        count: collections.len(),
        total,
        profit: profit_of(total),
    }
}

/// Partitions the EMI list by `is_paid_this_month`.
#[must_use]
pub fn summarize_emis(emis: &[EmiRecord]) -> EmiSummary {
    emis.iter().fold(EmiSummary::default(), |mut acc, emi| {
        if emi.is_paid_this_month {
            acc.completed_count += 1;
        } else {
            acc.pending_count += 1;
            acc.pending_total += emi.amount;
        }
        acc
    })
}

impl DashboardSummary {
    /// Recomputes every dashboard figure from the two lists as of `today`.
    #[must_use]
    pub fn compute(
        collections: &[CollectionRecord],
        emis: &[EmiRecord],
        today: NaiveDate,
    ) -> Self {
        let monthly_collection_total = monthly_collection_total(collections, today);
        let emi_summary = summarize_emis(emis);

        Self {
            month: today.month(),
            year: today.year(),
            monthly_collection_total,
            monthly_profit: profit_of(monthly_collection_total),
            pending_emi_total: emi_summary.pending_total,
            net_balance: monthly_collection_total - emi_summary.pending_total,
            emis: emi_summary,
            collections: summarize_collections(collections),
        }
    }
}

impl ChartSet {
    /// Builds both chart series from a dashboard summary.
    #[must_use]
    pub fn from_summary(summary: &DashboardSummary) -> Self {
        let total = summary.monthly_collection_total;
        Self {
            collections_vs_emi: ChartSeries {
                title: "Collections vs EMI",
                labels: ["Collections", "EMI"],
                values: [total, summary.pending_emi_total],
            },
            profit_split: ChartSeries {
                title: "Profit split",
                labels: ["Profit (30%)", "Cost (70%)"],
                values: [summary.monthly_profit, cost_of(total)],
            },
        }
    }
}
