// CSV ingestion for transaction spreadsheets exported as text

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Raw tabular data: trimmed headers and row-major string cells
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV data from any reader
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        anyhow::bail!("CSV input has no header row");
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;

        // Skip fully blank lines (trailing newlines in spreadsheet exports)
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if record.len() > headers.len() {
            anyhow::bail!(
                "CSV row {} has {} fields but the header has {}",
                idx + 1,
                record.len(),
                headers.len()
            );
        }

        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    if rows.is_empty() {
        anyhow::bail!("CSV must contain at least one data row");
    }

    Ok(CsvData { headers, rows })
}

/// Read CSV data from a file on disk
pub fn read_csv_from_path(path: &Path) -> Result<CsvData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_csv(file).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Read CSV data from stdin
pub fn read_csv_from_stdin() -> Result<CsvData> {
    let stdin = io::stdin();
    read_csv(stdin.lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_basic() {
        let input = "Account Type,Credit\nSavings,100\nCurrent,250.5\n";
        let data = read_csv(input.as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["Account Type", "Credit"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[1], vec!["Current", "250.5"]);
    }

    #[test]
    fn test_read_csv_trims_headers() {
        let input = " Region , Debit \nNorth,1\n";
        let data = read_csv(input.as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["Region", "Debit"]);
    }

    #[test]
    fn test_read_csv_pads_short_rows() {
        let input = "a,b,c\n1,2\n";
        let data = read_csv(input.as_bytes()).unwrap();
        assert_eq!(data.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_read_csv_rejects_long_rows() {
        let input = "a,b\n1,2,3\n";
        let err = read_csv(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_read_csv_quoted_amounts() {
        let input = "Credit,Debit\n\"1,250.00\",0\n";
        let data = read_csv(input.as_bytes()).unwrap();
        assert_eq!(data.rows[0][0], "1,250.00");
    }

    #[test]
    fn test_read_csv_header_only() {
        let err = read_csv("x,y\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("at least one data row"));
    }

    #[test]
    fn test_read_csv_skips_blank_lines() {
        let input = "x,y\n1,2\n,\n";
        let data = read_csv(input.as_bytes()).unwrap();
        assert_eq!(data.rows.len(), 1);
    }
}
