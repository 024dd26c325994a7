// Entry point and high-level CLI flow.
//
// - Option [1] loads a helpdesk ticket CSV export, printing diagnostics.
// - Option [2] configures the pipeline filters (exclusions, anonymization,
//   search term).
// - Option [3] runs enrichment + aggregation and writes the processed-ticket
//   table, the monthly summary, both actor summaries and a JSON KPI file,
//   previewing each as a markdown table.
mod enrich;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use log::{info, warn};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::io::{self, Write};

use enrich::PipelineOptions;
use types::{ActorField, ProcessedTicketRow, RawTicketRow};

// In-memory app state so the CSV is loaded once but reports can be
// regenerated with different filters in a single run.
static APP_STATE: Lazy<std::sync::Mutex<AppState>> = Lazy::new(|| {
    std::sync::Mutex::new(AppState {
        data: None,
        options: PipelineOptions::default(),
    })
});

struct AppState {
    data: Option<Vec<RawTicketRow>>,
    options: PipelineOptions,
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Ask whether to go back to the menu after generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn parse_list(input: &str) -> HashSet<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Handle option [1]: load the ticket export.
fn handle_load() {
    let path = {
        let p = prompt("CSV path [ticket_export.csv]: ");
        if p.is_empty() {
            "ticket_export.csv".to_string()
        } else {
            p
        }
    };
    match loader::load_rows(&path) {
        Ok((data, report)) => {
            info!("loaded {} rows from {}", report.total_rows, path);
            println!(
                "Processing dataset... ({} rows loaded)",
                util::format_int(report.total_rows as i64)
            );
            if report.parse_errors > 0 {
                println!(
                    "Note: {} records skipped (unreadable CSV records).",
                    util::format_int(report.parse_errors as i64)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {:#}\n", e);
        }
    }
}

/// Handle option [2]: configure the pipeline filters. Blank input clears a
/// setting.
fn handle_filters() {
    let exclude_companies = parse_list(&prompt("Exclude companies (comma-separated): "));
    let exclude_persons = parse_list(&prompt("Exclude persons (comma-separated): "));
    let anonymize_columns: Vec<String> = prompt("Anonymize columns (comma-separated): ")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let term = prompt("Search term: ");
    let options = PipelineOptions {
        exclude_companies,
        exclude_persons,
        anonymize_columns,
        search_term: if term.is_empty() { None } else { Some(term) },
    };
    if options.is_default() {
        println!("Filters cleared.\n");
    } else {
        println!("Filters updated.\n");
    }
    APP_STATE.lock().unwrap().options = options;
}

/// Handle option [3]: run the pipeline and write every report.
fn handle_generate_reports() {
    let (data, options) = {
        let state = APP_STATE.lock().unwrap();
        (state.data.clone(), state.options.clone())
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");

    let (enriched, stats) = enrich::enrich_rows(&data);
    if stats.rows > 0 && stats.unknown_month * 2 >= stats.rows {
        warn!(
            "{} of {} rows have no parseable start date and fell into the '{}' month",
            stats.unknown_month,
            stats.rows,
            enrich::UNKNOWN_MONTH
        );
    }
    if stats.rows > 0 && stats.missing_identity * 2 >= stats.rows {
        warn!(
            "{} of {} rows carry no company, technician or caller name",
            stats.missing_identity, stats.rows
        );
    }
    let rows = enrich::apply_options(enriched, &options);
    info!("{} rows after filters", rows.len());

    let processed: Vec<ProcessedTicketRow> = rows.iter().map(ProcessedTicketRow::from).collect();
    let processed_file = "processed_tickets.csv";
    if let Err(e) = output::write_csv(processed_file, &processed) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Processed Tickets\n");
    output::preview_table_rows(&processed, 3);
    println!("(Full table exported to {})\n", processed_file);

    let monthly = reports::monthly_summary(&rows);
    let monthly_file = "monthly_summary.csv";
    if let Err(e) = output::write_csv(monthly_file, &monthly) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Monthly KPI Summary\n");
    output::preview_table_rows(&monthly, 3);
    println!("(Full table exported to {})\n", monthly_file);

    for (field, file, title) in [
        (
            ActorField::Technician,
            "technician_summary.csv",
            "Top 5 Technicians",
        ),
        (ActorField::Caller, "caller_summary.csv", "Top 5 Callers"),
    ] {
        let report = reports::actor_summary(&rows, field);
        if let Err(e) = output::write_actor_csv(file, field.label(), &report.summary) {
            eprintln!("Write error: {:#}", e);
        }
        println!("{}\n", title);
        output::preview_table_rows(&report.top, reports::TOP_N);
        println!("(Full table exported to {})\n", file);
    }

    let totals = reports::kpi_totals(&monthly);
    if let Err(e) = output::write_json("summary.json", &totals) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Overall KPIs (summary.json):");
    println!(
        "Total {} | Closed {} | Pending {} | SLA Violations {} | Closure % {} | SLA % {}\n",
        util::format_int(totals.total_tickets as i64),
        util::format_number(totals.closed_tickets, 0),
        util::format_number(totals.pending_tickets, 0),
        util::format_number(totals.sla_violations, 0),
        totals
            .avg_closure_pct
            .map(|p| format!("{:.1}", p))
            .unwrap_or_else(|| "-".to_string()),
        totals
            .avg_sla_pct
            .map(|p| format!("{:.1}", p))
            .unwrap_or_else(|| "-".to_string()),
    );
}

fn main() {
    env_logger::init();
    loop {
        println!("Ticket Analytics Report");
        println!("[1] Load ticket export");
        println!("[2] Configure filters");
        println!("[3] Generate reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                handle_filters();
            }
            "3" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
