// Primitives for reading CSV files.

use crate::results::io_common::{ColumnIndexes, ColumnNames};
use crate::results::*;

/// Reads a results table with a header row.
///
/// All the cells are read as text. Lines shorter than the header are
/// accepted: the missing cells are empty.
pub fn read_csv_results(path: &str, source: &InputSource) -> MapResult<Vec<RawResultRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { path, lineno: 1usize })?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => {
            warn!("read_csv_results: {} is empty", path);
            return Ok(vec![]);
        }
    };
    let names = ColumnNames::from_settings(source.columns.as_ref());
    let indexes = ColumnIndexes::resolve(&header, &names, path)?;

    let mut res: Vec<RawResultRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        if line.iter().all(|s| s.trim().is_empty()) {
            debug!("read_csv_results: skipping blank line {}", lineno);
            continue;
        }
        let cells: Vec<RawValue> = line
            .iter()
            .map(|s| {
                if s.is_empty() {
                    RawValue::Empty
                } else {
                    RawValue::from(s)
                }
            })
            .collect();
        res.push(indexes.row(&cells));
    }
    Ok(res)
}
