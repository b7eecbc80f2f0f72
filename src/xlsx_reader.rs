// Workbook ingestion (xlsx / xlsm / xls / ods) via calamine

use crate::csv_reader::CsvData;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Read the first worksheet of a workbook. Row 1 is the header.
pub fn read_workbook(path: &Path) -> Result<CsvData> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook '{}'", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("Workbook '{}' has no worksheets", path.display()))?
        .with_context(|| format!("Failed to read first worksheet of '{}'", path.display()))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .ok_or_else(|| anyhow::anyhow!("Worksheet has no header row"))?
        .iter()
        .map(|c| cell_to_string(c).trim().to_string())
        .collect();

    let rows: Vec<Vec<String>> = sheet_rows
        .map(|r| r.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
        .collect();

    if rows.is_empty() {
        anyhow::bail!("Worksheet must contain at least one data row");
    }

    tracing::debug!(
        columns = headers.len(),
        rows = rows.len(),
        "loaded worksheet from {}",
        path.display()
    );

    Ok(CsvData { headers, rows })
}

/// Render a worksheet cell the way it would appear in a CSV export
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
