use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::results::io_common::{ColumnIndexes, ColumnNames};
use crate::results::*;

pub fn read_excel_results(path: &str, source: &InputSource) -> MapResult<Vec<RawResultRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &source.excel_worksheet_name {
        Some(sheet) => workbook
            .worksheet_range(sheet)
            .context(MissingWorksheetSnafu { sheet, path })?,
        None => workbook.worksheet_range_at(0).context(EmptyExcelSnafu { path })?,
    }
    .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|c| read_cell(c).as_text())
        .collect();
    let names = ColumnNames::from_settings(source.columns.as_ref());
    let indexes = ColumnIndexes::resolve(&header, &names, path)?;

    let mut res: Vec<RawResultRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cells: Vec<RawValue> = row.iter().map(read_cell).collect();
        if cells.iter().all(|c| c.is_empty()) {
            debug!("read_excel_results: skipping blank row {}", idx + 2);
            continue;
        }
        res.push(indexes.row(&cells));
    }
    Ok(res)
}

fn read_cell(cell: &DataType) -> RawValue {
    match cell {
        DataType::String(s) => RawValue::Text(s.clone()),
        DataType::Int(i) => RawValue::Int(*i),
        DataType::Float(f) => RawValue::Float(*f),
        DataType::Empty => RawValue::Empty,
        x => {
            debug!("read_cell: unexpected cell {:?}, read as text", x);
            RawValue::Text(x.to_string())
        }
    }
}
