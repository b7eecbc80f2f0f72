use crate::csv_reader::{self, CsvData};
use crate::error::DatasetError;
use crate::filter::CompiledFilter;
use crate::xlsx_reader;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::path::Path;

/// The loaded transaction table. Cells stay as text; typing happens on access.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 0-based position of each row in the loaded file; survives filtering
    pub row_numbers: Vec<usize>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_numbers = (0..rows.len()).collect();
        Self {
            headers,
            rows,
            row_numbers,
        }
    }

    pub fn from_csv(csv: CsvData) -> Self {
        Self::new(csv.headers, csv.rows)
    }

    /// Load a dataset, picking the reader from the file extension.
    /// `-` reads CSV from stdin.
    pub fn load(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            return csv_reader::read_csv_from_stdin()
                .context("Failed to read CSV from stdin")
                .map(Self::from_csv);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let dataset = match ext.as_str() {
            "csv" | "txt" => Self::from_csv(csv_reader::read_csv_from_path(path)?),
            "xlsx" | "xlsm" | "xls" | "ods" => Self::from_csv(xlsx_reader::read_workbook(path)?),
            "json" => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read '{}'", path.display()))?;
                let value: Value = serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse JSON in '{}'", path.display()))?;
                Self::from_json(&value)?
            }
            other => return Err(DatasetError::UnsupportedFormat(other.to_string()).into()),
        };

        tracing::info!(
            rows = dataset.len(),
            columns = dataset.headers.len(),
            "loaded dataset from {}",
            path.display()
        );

        Ok(dataset)
    }

    /// Create a Dataset from a JSON Array of Objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        // Headers from the first object, in file order
        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => String::new(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Ok(Self::new(headers, rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup
    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DatasetError::MissingColumn(wanted.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_ok()
    }

    pub fn text_column(&self, name: &str) -> Result<Vec<&str>, DatasetError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].trim()).collect())
    }

    /// Parse a column as transaction amounts. Blank cells are zero.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, DatasetError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                parse_amount(&row[idx]).ok_or_else(|| DatasetError::InvalidNumber {
                    column: self.headers[idx].clone(),
                    row: row_idx + 1,
                    value: row[idx].clone(),
                })
            })
            .collect()
    }

    /// Source row number of the `i`-th row
    pub fn row_number(&self, i: usize) -> usize {
        self.row_numbers.get(i).copied().unwrap_or(i)
    }

    /// First `n` rows (the dashboard preview)
    pub fn head(&self, n: usize) -> Dataset {
        Dataset {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
            row_numbers: (0..self.rows.len().min(n)).map(|i| self.row_number(i)).collect(),
        }
    }

    /// Rows matching the filter, in their original order
    pub fn filter(&self, filter: &CompiledFilter) -> Dataset {
        let (row_numbers, rows) = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, row)| (self.row_number(i), row.clone()))
            .unzip();
        Dataset {
            headers: self.headers.clone(),
            rows,
            row_numbers,
        }
    }
}

/// Parse an amount cell: tolerates thousands separators and padding.
/// Blank is a zero amount; anything else unparseable is `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != ' ').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_dataset() -> Dataset {
        Dataset::new(
            vec!["Account Type".to_string(), "Credit".to_string()],
            vec![
                vec!["Savings".to_string(), "100".to_string()],
                vec!["Current".to_string(), "1,250.50".to_string()],
                vec!["Savings".to_string(), "".to_string()],
            ],
        )
    }

    #[test]
    fn test_column_index_case_insensitive() {
        let ds = make_dataset();
        assert_eq!(ds.column_index("account type").unwrap(), 0);
        assert_eq!(ds.column_index(" CREDIT ").unwrap(), 1);
        assert!(ds.has_column("Credit"));
        assert!(!ds.has_column("Time"));
    }

    #[test]
    fn test_column_index_missing() {
        let ds = make_dataset();
        let err = ds.column_index("Region").unwrap_err();
        assert_eq!(err, DatasetError::MissingColumn("Region".to_string()));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_numeric_column_amounts() {
        let ds = make_dataset();
        assert_eq!(ds.numeric_column("Credit").unwrap(), vec![100.0, 1250.5, 0.0]);
    }

    #[test]
    fn test_numeric_column_invalid() {
        let mut ds = make_dataset();
        ds.rows[1][1] = "n/a".to_string();
        let err = ds.numeric_column("Credit").unwrap_err();
        assert_eq!(
            err,
            DatasetError::InvalidNumber {
                column: "Credit".to_string(),
                row: 2,
                value: "n/a".to_string(),
            }
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_head() {
        let ds = make_dataset();
        assert_eq!(ds.head(2).len(), 2);
        assert_eq!(ds.head(10).len(), 3);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 42 "), Some(42.0));
        assert_eq!(parse_amount("-3.5"), Some(-3.5));
        assert_eq!(parse_amount(""), Some(0.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_from_json() {
        let value = json!([
            {"Region": "North", "Credit": 10},
            {"Region": "South", "Credit": null}
        ]);
        let ds = Dataset::from_json(&value).unwrap();
        assert_eq!(ds.len(), 2);
        let region = ds.column_index("Region").unwrap();
        assert_eq!(ds.rows[1][region], "South");
        let credit = ds.column_index("Credit").unwrap();
        assert_eq!(ds.rows[1][credit], "");
    }

    #[test]
    fn test_from_json_keeps_file_column_order() {
        let value: Value = serde_json::from_str(
            r#"[{"Region": "North", "Credit": 5, "Account Type": "Savings"}]"#,
        )
        .unwrap();
        let ds = Dataset::from_json(&value).unwrap();
        assert_eq!(ds.headers, vec!["Region", "Credit", "Account Type"]);
        assert_eq!(ds.rows[0], vec!["North", "5", "Savings"]);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(Dataset::from_json(&json!({"a": 1})).is_err());
        assert!(Dataset::from_json(&json!([])).is_err());
    }

    #[test]
    fn test_load_unsupported_extension() {
        let err = Dataset::load(Path::new("transactions.parquet")).unwrap_err();
        assert!(err.to_string().contains("Unsupported input format"));
    }
}
