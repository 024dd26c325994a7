// Row enrichment: raw ticket rows in, derived identity/state fields out.
//
// Nothing in here fails on bad data. A half-filled spreadsheet still yields
// a full set of enriched rows; missing or garbage cells degrade to "", 0 or
// the "Unknown" month bucket.
use chrono::Datelike;
use std::collections::HashSet;

use crate::types::{EnrichedRow, RawTicketRow};
use crate::util::{parse_date_safe, parse_f64_safe};

pub const COL_ORGANIZATION: &str = "Organization->Name";
pub const COL_AGENT: &str = "Agent->Full name";
pub const COL_CALLER: &str = "Caller->Full name";
pub const COL_START_DATE: &str = "Start date";
pub const COL_DONE: &str = "Done Tasks";
pub const COL_PENDING: &str = "Pending Tasks";
pub const COL_SLA_TTO: &str = "SLA TTO Done";
pub const COL_SLA_TTR: &str = "SLA TTR Done";
pub const COL_DURATION: &str = "Duration (days)";

/// Sentinel bucket for rows whose start date is missing or unparseable.
pub const UNKNOWN_MONTH: &str = "Unknown";

/// How often enrichment had to fall back to a sentinel. The caller decides
/// whether the share is high enough to warn the user about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub rows: usize,
    pub unknown_month: usize,
    pub missing_identity: usize,
}

/// Filters applied between enrichment and aggregation. Carried explicitly as
/// a value instead of ambient UI state so a pipeline run is a pure function
/// of (rows, options).
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub exclude_companies: HashSet<String>,
    pub exclude_persons: HashSet<String>,
    /// Source-column names such as `Organization->Name`. Values are replaced
    /// with `"<prefix> <row index>"` where prefix is the part before `->`.
    pub anonymize_columns: Vec<String>,
    pub search_term: Option<String>,
}

impl PipelineOptions {
    pub fn is_default(&self) -> bool {
        self.exclude_companies.is_empty()
            && self.exclude_persons.is_empty()
            && self.anonymize_columns.is_empty()
            && self.search_term.is_none()
    }
}

/// Trim and collapse internal whitespace runs of a display name.
pub fn clean_name(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn identity_field(raw: &RawTicketRow, column: &str) -> String {
    raw.get(column).map(clean_name).unwrap_or_default()
}

fn flag_field(raw: &RawTicketRow, column: &str) -> f64 {
    parse_f64_safe(raw.get(column)).unwrap_or(0.0)
}

fn month_bucket(raw: &RawTicketRow) -> String {
    match parse_date_safe(raw.get(COL_START_DATE)) {
        Some(d) => format!("{:04}-{:02}", d.year(), d.month()),
        None => UNKNOWN_MONTH.to_string(),
    }
}

/// Derive all identity and ticket-state fields for one raw row.
pub fn enrich_row(raw: &RawTicketRow) -> EnrichedRow {
    EnrichedRow {
        company_name: identity_field(raw, COL_ORGANIZATION),
        technician_name: identity_field(raw, COL_AGENT),
        caller_name: identity_field(raw, COL_CALLER),
        month_bucket: month_bucket(raw),
        done_flag: flag_field(raw, COL_DONE),
        pending_flag: flag_field(raw, COL_PENDING),
        sla_tto_met: flag_field(raw, COL_SLA_TTO),
        sla_ttr_met: flag_field(raw, COL_SLA_TTR),
        duration_days: flag_field(raw, COL_DURATION).max(0.0),
        raw: raw.clone(),
    }
}

/// Enrich a whole export, counting how many rows hit a sentinel path.
pub fn enrich_rows(rows: &[RawTicketRow]) -> (Vec<EnrichedRow>, EnrichStats) {
    let mut stats = EnrichStats {
        rows: rows.len(),
        ..EnrichStats::default()
    };
    let enriched: Vec<EnrichedRow> = rows
        .iter()
        .map(|raw| {
            let row = enrich_row(raw);
            if row.month_bucket == UNKNOWN_MONTH {
                stats.unknown_month += 1;
            }
            if row.company_name.is_empty()
                && row.technician_name.is_empty()
                && row.caller_name.is_empty()
            {
                stats.missing_identity += 1;
            }
            row
        })
        .collect();
    (enriched, stats)
}

fn anonymize(rows: &mut [EnrichedRow], columns: &[String]) {
    for column in columns {
        let prefix = column.split("->").next().unwrap_or(column).trim();
        for (i, row) in rows.iter_mut().enumerate() {
            let label = format!("{} {}", prefix, i + 1);
            match column.as_str() {
                COL_ORGANIZATION => row.company_name = label.clone(),
                COL_AGENT => row.technician_name = label.clone(),
                COL_CALLER => row.caller_name = label.clone(),
                _ => {}
            }
            row.raw.set(column, label);
        }
    }
}

fn matches_search(row: &EnrichedRow, term: &str) -> bool {
    let term = term.to_lowercase();
    row.technician_name.to_lowercase().contains(&term)
        || row.caller_name.to_lowercase().contains(&term)
        || row.company_name.to_lowercase().contains(&term)
}

/// Apply exclusions, anonymization and the search filter, in that order
/// (exclusion lists refer to real names, so they run before anonymization).
pub fn apply_options(mut rows: Vec<EnrichedRow>, options: &PipelineOptions) -> Vec<EnrichedRow> {
    if !options.exclude_companies.is_empty() {
        rows.retain(|r| !options.exclude_companies.contains(&r.company_name));
    }
    if !options.exclude_persons.is_empty() {
        rows.retain(|r| {
            !options.exclude_persons.contains(&r.technician_name)
                && !options.exclude_persons.contains(&r.caller_name)
        });
    }
    if !options.anonymize_columns.is_empty() {
        anonymize(&mut rows, &options.anonymize_columns);
    }
    if let Some(term) = options.search_term.as_deref() {
        if !term.trim().is_empty() {
            rows.retain(|r| matches_search(r, term.trim()));
        }
    }
    rows
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn raw(pairs: &[(&str, &str)]) -> RawTicketRow {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawTicketRow::new(map)
    }

    #[test]
    fn empty_row_enriches_to_neutral_defaults() {
        let row = enrich_row(&raw(&[]));
        assert_eq!(row.company_name, "");
        assert_eq!(row.technician_name, "");
        assert_eq!(row.caller_name, "");
        assert_eq!(row.month_bucket, UNKNOWN_MONTH);
        assert_eq!(row.done_flag, 0.0);
        assert_eq!(row.pending_flag, 0.0);
        assert_eq!(row.sla_tto_met, 0.0);
        assert_eq!(row.sla_ttr_met, 0.0);
        assert_eq!(row.duration_days, 0.0);
    }

    #[test]
    fn garbage_cells_coerce_to_zero_per_field() {
        let row = enrich_row(&raw(&[
            (COL_DONE, "yes"),
            (COL_PENDING, " "),
            (COL_SLA_TTO, "1"),
            (COL_DURATION, "-3"),
        ]));
        assert_eq!(row.done_flag, 0.0);
        assert_eq!(row.pending_flag, 0.0);
        assert_eq!(row.sla_tto_met, 1.0);
        assert_eq!(row.sla_ttr_met, 0.0);
        // durations are clamped non-negative
        assert_eq!(row.duration_days, 0.0);
    }

    #[test]
    fn month_bucket_truncates_to_year_month() {
        let row = enrich_row(&raw(&[(COL_START_DATE, "2024-03-15 10:22:00")]));
        assert_eq!(row.month_bucket, "2024-03");
        let row = enrich_row(&raw(&[(COL_START_DATE, "not a date")]));
        assert_eq!(row.month_bucket, UNKNOWN_MONTH);
    }

    #[test]
    fn names_are_whitespace_normalized() {
        let row = enrich_row(&raw(&[(COL_AGENT, "  Ada   Lovelace ")]));
        assert_eq!(row.technician_name, "Ada Lovelace");
    }

    #[test]
    fn stats_count_sentinel_rows() {
        let rows = vec![
            raw(&[(COL_START_DATE, "2024-01-02"), (COL_AGENT, "Ada")]),
            raw(&[]),
            raw(&[]),
        ];
        let (_, stats) = enrich_rows(&rows);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.unknown_month, 2);
        assert_eq!(stats.missing_identity, 2);
    }

    #[test]
    fn exclusions_drop_matching_rows() {
        let rows = vec![
            raw(&[(COL_ORGANIZATION, "Acme"), (COL_AGENT, "Ada")]),
            raw(&[(COL_ORGANIZATION, "Globex"), (COL_AGENT, "Bob")]),
            raw(&[(COL_ORGANIZATION, "Globex"), (COL_CALLER, "Ada")]),
        ];
        let (enriched, _) = enrich_rows(&rows);
        let options = PipelineOptions {
            exclude_companies: ["Acme".to_string()].into_iter().collect(),
            exclude_persons: ["Ada".to_string()].into_iter().collect(),
            ..PipelineOptions::default()
        };
        let kept = apply_options(enriched, &options);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].technician_name, "Bob");
    }

    #[test]
    fn search_is_case_insensitive_over_identities() {
        let rows = vec![
            raw(&[(COL_AGENT, "Ada Lovelace")]),
            raw(&[(COL_CALLER, "Grace Hopper")]),
            raw(&[(COL_ORGANIZATION, "Hopper & Co")]),
        ];
        let (enriched, _) = enrich_rows(&rows);
        let options = PipelineOptions {
            search_term: Some("hopper".to_string()),
            ..PipelineOptions::default()
        };
        let kept = apply_options(enriched, &options);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn filters_apply_as_exclusion_then_anonymization_then_search() {
        // Exclusion lists name real companies, so they must run before
        // anonymization; the search term then matches the anonymized labels.
        let rows = vec![
            raw(&[(COL_ORGANIZATION, "Acme")]),
            raw(&[(COL_ORGANIZATION, "Globex")]),
            raw(&[(COL_ORGANIZATION, "Initech")]),
        ];
        let (enriched, _) = enrich_rows(&rows);
        let options = PipelineOptions {
            exclude_companies: ["Acme".to_string()].into_iter().collect(),
            anonymize_columns: vec![COL_ORGANIZATION.to_string()],
            search_term: Some("organization 2".to_string()),
            ..PipelineOptions::default()
        };
        let kept = apply_options(enriched, &options);
        // Acme is gone before labels are assigned, so Globex becomes
        // "Organization 1" and Initech "Organization 2"; the search keeps
        // only the latter.
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].company_name, "Organization 2");
        assert_eq!(kept[0].raw.get(COL_ORGANIZATION), Some("Organization 2"));
    }

    #[test]
    fn anonymize_rewrites_derived_field_and_raw_cell() {
        let rows = vec![
            raw(&[(COL_ORGANIZATION, "Acme")]),
            raw(&[(COL_ORGANIZATION, "Globex")]),
        ];
        let (enriched, _) = enrich_rows(&rows);
        let options = PipelineOptions {
            anonymize_columns: vec![COL_ORGANIZATION.to_string()],
            ..PipelineOptions::default()
        };
        let rows = apply_options(enriched, &options);
        assert_eq!(rows[0].company_name, "Organization 1");
        assert_eq!(rows[1].company_name, "Organization 2");
        assert_eq!(rows[1].raw.get(COL_ORGANIZATION), Some("Organization 2"));
    }
}
