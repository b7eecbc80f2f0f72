//! Dashboard configuration, loaded from an optional JSON file.
//!
//! Every field has a default, so `{}` is a valid configuration and the
//! defaults reproduce the stock transaction report.

use crate::dashboard::Task;
use crate::RenderOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Names of the dataset columns the report reads
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ColumnNames {
    #[serde(default = "default_account_type")]
    pub account_type: String,
    #[serde(default = "default_credit")]
    pub credit: String,
    #[serde(default = "default_debit")]
    pub debit: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Beneficiary bank of the transaction
    #[serde(default = "default_beneficiary")]
    pub beneficiary: String,
    #[serde(default = "default_time")]
    pub time: String,
}

fn default_account_type() -> String { "Account Type".to_string() }
fn default_credit() -> String { "Credit".to_string() }
fn default_debit() -> String { "Debit".to_string() }
fn default_region() -> String { "Region".to_string() }
fn default_beneficiary() -> String { "Transaction To".to_string() }
fn default_time() -> String { "Time".to_string() }

impl ColumnNames {
    /// The Credit and Debit columns, in that order
    pub fn amounts(&self) -> [&str; 2] {
        [self.credit.as_str(), self.debit.as_str()]
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            account_type: default_account_type(),
            credit: default_credit(),
            debit: default_debit(),
            region: default_region(),
            beneficiary: default_beneficiary(),
            time: default_time(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub columns: ColumnNames,
    /// Beneficiary banks kept per region
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// |z| above which a transaction is flagged
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Sections to render, in order
    #[serde(default = "Task::all")]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub render: RenderOptions,
}

/// Largest chart edge, in pixels
pub const MAX_CHART_SIZE: u32 = 10_000;

fn default_title() -> String { "Transaction Dashboard".to_string() }
fn default_description() -> String {
    "This dashboard visualizes insights from the transaction dataset.".to_string()
}
fn default_top_n() -> usize { 5 }
fn default_zscore_threshold() -> f64 { 3.0 }
fn default_preview_rows() -> usize { 5 }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            columns: ColumnNames::default(),
            top_n: default_top_n(),
            zscore_threshold: default_zscore_threshold(),
            preview_rows: default_preview_rows(),
            tasks: Task::all(),
            render: RenderOptions::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config '{}'", p.display()))?;
                Self::from_json_str(&text)
                    .with_context(|| format!("Invalid config '{}'", p.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse config JSON")
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            anyhow::bail!("top_n must be at least 1");
        }
        if !self.zscore_threshold.is_finite() || self.zscore_threshold <= 0.0 {
            anyhow::bail!("zscore_threshold must be a positive number");
        }
        if self.render.width < 100 || self.render.height < 100 {
            anyhow::bail!(
                "Chart size must be at least 100x100 (got {}x{})",
                self.render.width,
                self.render.height
            );
        }
        if self.render.width > MAX_CHART_SIZE || self.render.height > MAX_CHART_SIZE {
            anyhow::bail!(
                "Chart size must be at most {0}x{0} (got {1}x{2})",
                MAX_CHART_SIZE,
                self.render.width,
                self.render.height
            );
        }
        if self.tasks.is_empty() {
            anyhow::bail!("At least one task must be selected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;

    #[test]
    fn test_empty_json_is_default() {
        let config = DashboardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.columns.beneficiary, "Transaction To");
        assert_eq!(config.top_n, 5);
        assert_eq!(config.zscore_threshold, 3.0);
        assert_eq!(config.tasks.len(), 9);
    }

    #[test]
    fn test_partial_override() {
        let config = DashboardConfig::from_json_str(
            r#"{
                "columns": {"region": "Province"},
                "top_n": 3,
                "tasks": ["account-types", "time-trends"],
                "render": {"width": 1024, "type": "svg"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.columns.region, "Province");
        assert_eq!(config.columns.credit, "Credit");
        assert_eq!(config.top_n, 3);
        assert_eq!(config.tasks, vec![Task::AccountTypes, Task::TimeTrends]);
        assert_eq!(config.render.width, 1024);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.format, OutputFormat::Svg);
    }

    #[test]
    fn test_unknown_task_rejected() {
        assert!(DashboardConfig::from_json_str(r#"{"tasks": ["pie"]}"#).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = DashboardConfig::default();
        assert!(config.validate().is_ok());

        config.top_n = 0;
        assert!(config.validate().is_err());

        config = DashboardConfig::default();
        config.zscore_threshold = f64::NAN;
        assert!(config.validate().is_err());

        config = DashboardConfig::default();
        config.render.height = 20;
        assert!(config.validate().unwrap_err().to_string().contains("100x100"));

        config = DashboardConfig::default();
        config.render.width = 40_000;
        config.render.height = 40_000;
        assert!(config.validate().unwrap_err().to_string().contains("at most 10000x10000"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = DashboardConfig::load(Some(Path::new("no/such/config.json")));
        assert!(result.is_err());
    }
}
