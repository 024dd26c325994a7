use serde::Serialize;
use std::collections::HashMap;
use tabled::Tabled;

use crate::util::format_number;

/// One ticket exactly as ingested: an open-ended mapping from column name to
/// raw cell text. Spreadsheet exports carry no fixed schema, so every lookup
/// goes through [`RawTicketRow::get`], which treats absent and blank cells the
/// same way.
#[derive(Debug, Clone, Default)]
pub struct RawTicketRow {
    columns: HashMap<String, String>,
}

impl RawTicketRow {
    pub fn new(columns: HashMap<String, String>) -> Self {
        Self { columns }
    }

    /// Look up a column, returning `None` when the column is absent or the
    /// cell is empty/whitespace-only. All coerce-or-default policies build on
    /// this single accessor.
    pub fn get(&self, column: &str) -> Option<&str> {
        match self.columns.get(column) {
            Some(v) => {
                let v = v.trim();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            }
            None => None,
        }
    }

    pub fn set(&mut self, column: &str, value: String) {
        self.columns.insert(column.to_string(), value);
    }
}

/// A raw ticket plus every derived field the aggregators read. All flags are
/// concrete numbers (0 substituted for missing/garbage source data) so sums
/// and means downstream never see a hole.
#[derive(Debug, Clone)]
pub struct EnrichedRow {
    pub raw: RawTicketRow,
    pub company_name: String,
    pub technician_name: String,
    pub caller_name: String,
    pub month_bucket: String,
    pub done_flag: f64,
    pub pending_flag: f64,
    pub sla_tto_met: f64,
    pub sla_ttr_met: f64,
    pub duration_days: f64,
}

/// Which identity dimension an actor summary groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorField {
    Technician,
    Caller,
}

impl ActorField {
    pub fn key<'a>(&self, row: &'a EnrichedRow) -> &'a str {
        match self {
            ActorField::Technician => &row.technician_name,
            ActorField::Caller => &row.caller_name,
        }
    }

    /// Label column name used in exported tables.
    pub fn label(&self) -> &'static str {
        match self {
            ActorField::Technician => "Technician Name",
            ActorField::Caller => "Caller Name",
        }
    }
}

/// Flat, fixed-column view of an enriched ticket for CSV export and previews.
/// Column names are stable across runs; exporters key on them.
#[derive(Debug, Clone, Serialize, Tabled, PartialEq)]
pub struct ProcessedTicketRow {
    #[serde(rename = "Ref")]
    #[tabled(rename = "Ref")]
    pub ref_id: String,
    #[serde(rename = "Company Name")]
    #[tabled(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Technician Name")]
    #[tabled(rename = "Technician Name")]
    pub technician_name: String,
    #[serde(rename = "Caller Name")]
    #[tabled(rename = "Caller Name")]
    pub caller_name: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month_bucket: String,
    #[serde(rename = "Done Tasks")]
    #[tabled(rename = "Done Tasks")]
    pub done_flag: f64,
    #[serde(rename = "Pending Tasks")]
    #[tabled(rename = "Pending Tasks")]
    pub pending_flag: f64,
    #[serde(rename = "SLA TTO Done")]
    #[tabled(rename = "SLA TTO Done")]
    pub sla_tto_met: f64,
    #[serde(rename = "SLA TTR Done")]
    #[tabled(rename = "SLA TTR Done")]
    pub sla_ttr_met: f64,
    #[serde(rename = "Duration (days)")]
    #[tabled(rename = "Duration (days)", display_with = "display_f2")]
    pub duration_days: f64,
}

impl From<&EnrichedRow> for ProcessedTicketRow {
    fn from(row: &EnrichedRow) -> Self {
        ProcessedTicketRow {
            ref_id: row.raw.get("Ref").unwrap_or("").to_string(),
            company_name: row.company_name.clone(),
            technician_name: row.technician_name.clone(),
            caller_name: row.caller_name.clone(),
            month_bucket: row.month_bucket.clone(),
            done_flag: row.done_flag,
            pending_flag: row.pending_flag,
            sla_tto_met: row.sla_tto_met,
            sla_ttr_met: row.sla_ttr_met,
            duration_days: row.duration_days,
        }
    }
}

/// One row per distinct month bucket. Percentages are `None` (blank in CSV,
/// `-` in previews) when the group has no tickets to divide by.
#[derive(Debug, Clone, Serialize, Tabled, PartialEq)]
pub struct MonthlySummaryRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month_bucket: String,
    #[serde(rename = "Total Tickets")]
    #[tabled(rename = "Total Tickets")]
    pub total_tickets: u64,
    #[serde(rename = "Closed Tickets")]
    #[tabled(rename = "Closed Tickets")]
    pub closed_tickets: f64,
    #[serde(rename = "Pending Tickets")]
    #[tabled(rename = "Pending Tickets")]
    pub pending_tickets: f64,
    #[serde(rename = "SLA TTO Done")]
    #[tabled(rename = "SLA TTO Done")]
    pub sla_tto_done: f64,
    #[serde(rename = "SLA TTR Done")]
    #[tabled(rename = "SLA TTR Done")]
    pub sla_ttr_done: f64,
    #[serde(rename = "Avg Resolution Days")]
    #[tabled(rename = "Avg Resolution Days", display_with = "display_f2")]
    pub avg_resolution_days: f64,
    #[serde(rename = "SLA TTO Violations")]
    #[tabled(rename = "SLA TTO Violations")]
    pub sla_tto_violations: f64,
    #[serde(rename = "SLA TTR Violations")]
    #[tabled(rename = "SLA TTR Violations")]
    pub sla_ttr_violations: f64,
    #[serde(rename = "SLA Violations")]
    #[tabled(rename = "SLA Violations")]
    pub sla_violations: f64,
    #[serde(rename = "Closure %")]
    #[tabled(rename = "Closure %", display_with = "display_pct")]
    pub closure_pct: Option<f64>,
    #[serde(rename = "SLA %")]
    #[tabled(rename = "SLA %", display_with = "display_pct")]
    pub sla_pct: Option<f64>,
}

/// Per-actor aggregate in first-seen grouping order (the export view).
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSummaryRow {
    pub actor: String,
    pub tickets: u64,
    pub done: f64,
    pub sla_tto_done: f64,
    pub sla_ttr_done: f64,
    pub sla_pct: Option<f64>,
}

/// One leaderboard entry: an [`ActorSummaryRow`] slice with its rank attached.
#[derive(Debug, Clone, Tabled, PartialEq)]
pub struct LeaderboardRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Name")]
    pub actor: String,
    #[tabled(rename = "Tickets")]
    pub tickets: u64,
    #[tabled(rename = "Done")]
    pub done: f64,
    #[tabled(rename = "SLA %", display_with = "display_pct")]
    pub sla_pct: Option<f64>,
}

/// Full per-actor summary plus the truncated top-5 view. The top view is
/// always a sorted slice of `summary`, never recomputed on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorReport {
    pub summary: Vec<ActorSummaryRow>,
    pub top: Vec<LeaderboardRow>,
}

/// Dashboard-card totals rolled up from the monthly summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KpiTotals {
    pub total_tickets: u64,
    pub closed_tickets: f64,
    pub pending_tickets: f64,
    pub sla_violations: f64,
    pub avg_closure_pct: Option<f64>,
    pub avg_sla_pct: Option<f64>,
}

fn display_pct(v: &Option<f64>) -> String {
    match v {
        Some(p) => format!("{:.1}", p),
        None => "-".to_string(),
    }
}

fn display_f2(v: &f64) -> String {
    format_number(*v, 2)
}
