use anyhow::Context;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;

use crate::types::RawTicketRow;

/// What happened while reading an export. Data-quality problems inside
/// well-formed records are not errors; only records the CSV reader cannot
/// decode at all are counted and skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
}

/// Read ticket rows from any CSV source. Rows are kept schema-less: each
/// record becomes a column-name → cell-text map, so later stages decide what
/// to do with missing or malformed cells.
pub fn read_rows<R: Read>(reader: R) -> (Vec<RawTicketRow>, LoadReport) {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.deserialize::<HashMap<String, String>>() {
        report.total_rows += 1;
        match result {
            Ok(map) => rows.push(RawTicketRow::new(map)),
            Err(_) => report.parse_errors += 1,
        }
    }
    (rows, report)
}

pub fn load_rows(path: &str) -> anyhow::Result<(Vec<RawTicketRow>, LoadReport)> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path))?;
    Ok(read_rows(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_schemaless_rows_with_blank_cells() {
        let csv = "Ref,Start date,Agent->Full name\n\
                   T-1,2024-03-01,Ada\n\
                   T-2,,\n";
        let (rows, report) = read_rows(csv.as_bytes());
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.parse_errors, 0);
        assert_eq!(rows[0].get("Agent->Full name"), Some("Ada"));
        // blank cells read back as absent
        assert_eq!(rows[1].get("Start date"), None);
        assert_eq!(rows[1].get("No Such Column"), None);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let (rows, report) = read_rows("Ref,Start date\n".as_bytes());
        assert!(rows.is_empty());
        assert_eq!(report.total_rows, 0);
    }
}
