// Aggregation over enriched rows: the monthly summary, the per-actor
// summaries with their top-5 views, and the overall KPI totals.
//
// Both summaries run through the same `group_rows` accumulator and the same
// percentage helper, keyed differently. Grouping preserves first-seen input
// order so a rerun over identical input yields identical tables.
use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{
    ActorField, ActorReport, ActorSummaryRow, EnrichedRow, KpiTotals, LeaderboardRow,
    MonthlySummaryRow,
};
use crate::util::{average, pct, round0, round1};

/// Number of entries kept in a leaderboard view.
pub const TOP_N: usize = 5;

#[derive(Debug, Default, Clone)]
struct GroupAcc {
    tickets: u64,
    done: f64,
    pending: f64,
    sla_tto_done: f64,
    sla_ttr_done: f64,
    durations: Vec<f64>,
}

impl GroupAcc {
    fn add(&mut self, row: &EnrichedRow) {
        self.tickets += 1;
        self.done += row.done_flag;
        self.pending += row.pending_flag;
        self.sla_tto_done += row.sla_tto_met;
        self.sla_ttr_done += row.sla_ttr_met;
        self.durations.push(row.duration_days);
    }

    fn sla_pct(&self) -> Option<f64> {
        pct(self.sla_tto_done + self.sla_ttr_done, 2.0 * self.tickets as f64)
    }
}

/// Partition rows by an arbitrary key, keeping groups in first-seen order.
fn group_rows<K, F>(rows: &[EnrichedRow], key_fn: F) -> Vec<(K, GroupAcc)>
where
    K: Eq + Hash + Clone,
    F: Fn(&EnrichedRow) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, GroupAcc)> = Vec::new();
    for row in rows {
        let key = key_fn(row);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, GroupAcc::default()));
            groups.len() - 1
        });
        groups[slot].1.add(row);
    }
    groups
}

/// Group by month bucket and derive the per-month KPI row set, sorted
/// ascending by bucket ("Unknown" sorts after every "YYYY-MM" key). An empty
/// input yields an empty table.
pub fn monthly_summary(rows: &[EnrichedRow]) -> Vec<MonthlySummaryRow> {
    let mut groups = group_rows(rows, |r| r.month_bucket.clone());
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
        .into_iter()
        .map(|(bucket, acc)| {
            let total = acc.tickets as f64;
            let tto_violations = total - acc.sla_tto_done;
            let ttr_violations = total - acc.sla_ttr_done;
            MonthlySummaryRow {
                month_bucket: bucket,
                total_tickets: acc.tickets,
                closed_tickets: acc.done,
                pending_tickets: acc.pending,
                sla_tto_done: acc.sla_tto_done,
                sla_ttr_done: acc.sla_ttr_done,
                avg_resolution_days: average(&acc.durations),
                sla_tto_violations: tto_violations,
                sla_ttr_violations: ttr_violations,
                sla_violations: round0((tto_violations + ttr_violations) / 2.0),
                closure_pct: pct(acc.done, total),
                sla_pct: acc.sla_pct(),
            }
        })
        .collect()
}

/// Group by the chosen identity field and derive the per-actor summary plus
/// its ranked top-5 view. The top view is a stable descending sort of a copy
/// of the full summary, truncated; ties keep grouping order.
pub fn actor_summary(rows: &[EnrichedRow], field: ActorField) -> ActorReport {
    let summary: Vec<ActorSummaryRow> = group_rows(rows, |r| field.key(r).to_string())
        .into_iter()
        .map(|(actor, acc)| ActorSummaryRow {
            actor,
            tickets: acc.tickets,
            done: acc.done,
            sla_tto_done: acc.sla_tto_done,
            sla_ttr_done: acc.sla_ttr_done,
            sla_pct: acc.sla_pct(),
        })
        .collect();

    let mut ranked = summary.clone();
    // Vec::sort_by is stable; undefined percentages sort last.
    ranked.sort_by(|a, b| match (b.sla_pct, a.sla_pct) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    });
    let top = ranked
        .into_iter()
        .take(TOP_N)
        .enumerate()
        .map(|(i, row)| LeaderboardRow {
            rank: i + 1,
            actor: row.actor,
            tickets: row.tickets,
            done: row.done,
            sla_pct: row.sla_pct,
        })
        .collect();

    ActorReport { summary, top }
}

/// Roll the monthly summary up into dashboard-card totals. The percentage
/// averages cover only months with a defined percentage and are `None` when
/// there are none.
pub fn kpi_totals(monthly: &[MonthlySummaryRow]) -> KpiTotals {
    let closure: Vec<f64> = monthly.iter().filter_map(|m| m.closure_pct).collect();
    let sla: Vec<f64> = monthly.iter().filter_map(|m| m.sla_pct).collect();
    KpiTotals {
        total_tickets: monthly.iter().map(|m| m.total_tickets).sum(),
        closed_tickets: monthly.iter().map(|m| m.closed_tickets).sum(),
        pending_tickets: monthly.iter().map(|m| m.pending_tickets).sum(),
        sla_violations: monthly.iter().map(|m| m.sla_violations).sum(),
        avg_closure_pct: if closure.is_empty() {
            None
        } else {
            Some(round1(average(&closure)))
        },
        avg_sla_pct: if sla.is_empty() {
            None
        } else {
            Some(round1(average(&sla)))
        },
    }
}
