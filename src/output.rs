use anyhow::Context;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::types::ActorSummaryRow;

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Actor summaries carry a caller-chosen label column ("Technician Name" or
/// "Caller Name"), so their header is written by hand instead of via serde.
pub fn write_actor_csv(path: &str, label: &str, rows: &[ActorSummaryRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path))?;
    wtr.write_record([
        label,
        "Tickets",
        "Done",
        "SLA TTO Done",
        "SLA TTR Done",
        "SLA %",
    ])?;
    for r in rows {
        let sla_pct = match r.sla_pct {
            Some(p) => format!("{:.1}", p),
            None => String::new(),
        };
        let record = [
            r.actor.clone(),
            r.tickets.to_string(),
            r.done.to_string(),
            r.sla_tto_done.to_string(),
            r.sla_ttr_done.to_string(),
            sla_pct,
        ];
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path))?;
    Ok(())
}

/// Print the first `max_rows` rows of a report as a markdown table.
pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
