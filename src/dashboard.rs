// Dashboard pipeline: filter the dataset, then run each report task in order

use crate::aggregate;
use crate::config::DashboardConfig;
use crate::data::Dataset;
use crate::error::DatasetError;
use crate::filter::{self, CompiledFilter};
use crate::ir::{
    BoxSeries, Chart, Dashboard, Figure, HeatScale, PointLayer, Preview, Section, SectionBody,
    Series, Slice,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One section of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    AccountTypes,
    BankFlow,
    RegionHeatmap,
    CreditAnomalies,
    TypeComparison,
    TimeTrends,
    CustomerInsights,
    DebitAnomalies,
    AmountCorrelation,
}

impl Task {
    /// Every task in report order
    pub fn all() -> Vec<Task> {
        vec![
            Task::AccountTypes,
            Task::BankFlow,
            Task::RegionHeatmap,
            Task::CreditAnomalies,
            Task::TypeComparison,
            Task::TimeTrends,
            Task::CustomerInsights,
            Task::DebitAnomalies,
            Task::AmountCorrelation,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Task::AccountTypes => "account-types",
            Task::BankFlow => "bank-flow",
            Task::RegionHeatmap => "region-heatmap",
            Task::CreditAnomalies => "credit-anomalies",
            Task::TypeComparison => "type-comparison",
            Task::TimeTrends => "time-trends",
            Task::CustomerInsights => "customer-insights",
            Task::DebitAnomalies => "debit-anomalies",
            Task::AmountCorrelation => "amount-correlation",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Task::AccountTypes => "Task 1: Account Type Distribution",
            Task::BankFlow => "Task 2: Transaction Flow by Beneficiary Bank",
            Task::RegionHeatmap => "Task 3: Geographic Heatmap of Transactions",
            Task::CreditAnomalies => "Task 4: Anomalies in Transactions",
            Task::TypeComparison => "Task 5: Comparative Analysis of Transaction Types",
            Task::TimeTrends => "Task 6: Time-Based Analysis",
            Task::CustomerInsights => "Task 7: Customer Insights",
            Task::DebitAnomalies => "Bonus: Anomalies in Debit Transactions",
            Task::AmountCorrelation => "Bonus: Credit and Debit Correlation",
        }
    }
}

pub const NO_VALID_TIME: &str = "No valid time data found in the dataset.";
pub const EMPTY_TIME_SERIES: &str = "Time series data is empty after processing.";

/// Run the whole report: apply the optional filter, then every configured task
pub fn build_dashboard(
    data: &Dataset,
    source: &str,
    filter_expr: Option<&str>,
    config: &DashboardConfig,
) -> Result<Dashboard> {
    let filtered;
    let data = match filter_expr {
        Some(expr) => {
            let parsed = filter::parse_expression(expr)?;
            let compiled = CompiledFilter::compile(&parsed, data)
                .with_context(|| format!("Cannot apply filter '{}'", expr))?;
            filtered = data.filter(&compiled);
            info!(
                kept = filtered.len(),
                total = data.len(),
                "applied filter '{}'",
                expr
            );
            &filtered
        }
        None => data,
    };

    let preview = data.head(config.preview_rows);

    let mut sections = Vec::with_capacity(config.tasks.len());
    for &task in &config.tasks {
        let body = run_task(task, data, config)?;
        sections.push(Section {
            task,
            heading: task.heading().to_string(),
            body,
        });
    }

    Ok(Dashboard {
        title: config.title.clone(),
        description: config.description.clone(),
        source: source.to_string(),
        filter: filter_expr.map(|s| s.to_string()),
        row_count: data.len(),
        preview: Preview {
            headers: preview.headers,
            rows: preview.rows,
        },
        sections,
    })
}

/// Build one section. Missing columns and empty aggregations become notices;
/// malformed data aborts the run.
pub fn run_task(task: Task, data: &Dataset, config: &DashboardConfig) -> Result<SectionBody> {
    let result = match task {
        Task::AccountTypes => account_types(data, config),
        Task::BankFlow => bank_flow(data, config),
        Task::RegionHeatmap => region_heatmap(data, config),
        Task::CreditAnomalies => anomalies(data, &config.columns.credit, config),
        Task::TypeComparison => type_comparison(data, config),
        Task::TimeTrends => time_trends(data, config),
        Task::CustomerInsights => customer_insights(data, config),
        Task::DebitAnomalies => anomalies(data, &config.columns.debit, config),
        Task::AmountCorrelation => amount_correlation(data, config),
    };

    match result {
        Ok(body) => {
            debug!(task = task.id(), "section built");
            Ok(body)
        }
        Err(e) if e.is_recoverable() => {
            let message = notice_for(&e);
            warn!(task = task.id(), "{}", message);
            Ok(SectionBody::Notice(message))
        }
        Err(e) => Err(e).with_context(|| format!("Task '{}' failed", task.id())),
    }
}

fn notice_for(err: &DatasetError) -> String {
    match err {
        DatasetError::MissingColumn(col) => {
            format!("The '{}' column is not available in the dataset.", col)
        }
        DatasetError::Empty => "No data available for this section.".to_string(),
        other => other.to_string(),
    }
}

fn chart(title: String, x_label: Option<String>, y_label: Option<String>, chart: Chart) -> SectionBody {
    SectionBody::Chart(Figure {
        title,
        x_label,
        y_label,
        chart,
    })
}

fn account_types(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let col = &config.columns.account_type;
    let counts = aggregate::value_counts(data, col)?;
    let slices = counts
        .into_iter()
        .map(|c| Slice {
            label: c.category,
            value: c.count as f64,
        })
        .collect();
    Ok(chart(
        format!("{} Distribution", col),
        None,
        None,
        Chart::Pie { slices },
    ))
}

fn bank_flow(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let cols = &config.columns;
    let ranked =
        aggregate::top_n_per_group(data, &cols.region, &cols.beneficiary, &cols.credit, config.top_n)?;

    // Banks and regions in order of first appearance (largest totals first)
    let mut banks: Vec<String> = Vec::new();
    let mut regions: Vec<String> = Vec::new();
    for pair in &ranked {
        if !banks.contains(&pair.item) {
            banks.push(pair.item.clone());
        }
        if !regions.contains(&pair.group) {
            regions.push(pair.group.clone());
        }
    }

    let series = regions
        .iter()
        .map(|region| Series {
            name: region.clone(),
            values: banks
                .iter()
                .map(|bank| {
                    ranked
                        .iter()
                        .find(|p| &p.group == region && &p.item == bank)
                        .map(|p| p.total)
                        .unwrap_or(0.0)
                })
                .collect(),
            color: None,
        })
        .collect();

    Ok(chart(
        format!(
            "Top {} Beneficiary Banks by {} Transactions per {}",
            config.top_n, cols.credit, cols.region
        ),
        Some("Beneficiary Bank".to_string()),
        Some(format!("{} Amount", cols.credit)),
        Chart::GroupedBar {
            categories: banks,
            series,
        },
    ))
}

fn region_heatmap(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let cols = &config.columns;
    let sums = aggregate::group_sums(data, &cols.region, &cols.amounts())?;
    let cells = sums
        .sums
        .iter()
        .map(|row| row.iter().map(|v| Some(*v)).collect())
        .collect();
    Ok(chart(
        "Geographic Heatmap of Transactions".to_string(),
        Some("Transaction Type".to_string()),
        Some(cols.region.clone()),
        Chart::Heatmap {
            rows: sums.keys,
            columns: sums.columns,
            cells,
            scale: HeatScale::Sequential,
            decimals: 2,
        },
    ))
}

fn anomalies(data: &Dataset, column: &str, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let scan = aggregate::zscore_outliers(data, column, config.zscore_threshold)?;
    info!(
        column,
        outliers = scan.outliers.len(),
        threshold = scan.threshold,
        "z-score scan"
    );

    let to_points = |pts: &[(usize, f64)]| -> Vec<(f64, f64)> {
        pts.iter().map(|&(i, v)| (i as f64, v)).collect()
    };
    Ok(chart(
        format!("Anomalies in {} Transactions", column),
        Some("Index".to_string()),
        Some(format!("{} Amount", column)),
        Chart::Scatter {
            layers: vec![
                PointLayer {
                    name: column.to_string(),
                    points: to_points(&scan.points),
                    color: None,
                    alpha: 0.5,
                    size: 3,
                },
                PointLayer {
                    name: format!("Outliers ({})", column),
                    points: to_points(&scan.outliers),
                    color: Some("red".to_string()),
                    alpha: 0.7,
                    size: 4,
                },
            ],
        },
    ))
}

fn type_comparison(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let cols = &config.columns;
    let groups = aggregate::melted_box_stats(data, &cols.account_type, &cols.amounts())?;
    let series = groups
        .variables
        .iter()
        .zip(groups.stats)
        .map(|(name, stats)| BoxSeries {
            name: name.clone(),
            stats,
        })
        .collect();
    Ok(chart(
        format!("Comparative Analysis of Transaction Types by {}", cols.account_type),
        Some(cols.account_type.clone()),
        Some("Transaction Amount".to_string()),
        Chart::Boxplot {
            categories: groups.categories,
            series,
        },
    ))
}

fn time_trends(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let cols = &config.columns;
    // Missing column keeps the generic "not available" notice
    data.column_index(&cols.time)?;

    let daily = match aggregate::daily_totals(data, &cols.time, &cols.amounts()) {
        Ok(d) => d,
        Err(DatasetError::Empty) => return Ok(SectionBody::Notice(NO_VALID_TIME.to_string())),
        Err(e) => return Err(e),
    };

    if daily.days.is_empty() {
        return Ok(SectionBody::Notice(EMPTY_TIME_SERIES.to_string()));
    }

    let colors = ["blue", "red"];
    let series = daily
        .columns
        .iter()
        .zip(daily.totals)
        .zip(colors)
        .map(|((name, values), color)| Series {
            name: name.clone(),
            values,
            color: Some(color.to_string()),
        })
        .collect();

    Ok(chart(
        "Transaction Trends Over Time".to_string(),
        Some(cols.time.clone()),
        Some("Transaction Amount".to_string()),
        Chart::TimeSeries {
            days: daily.days,
            series,
        },
    ))
}

fn customer_insights(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let cols = &config.columns;
    let sums = aggregate::group_sums(data, &cols.account_type, &cols.amounts())?;
    let series = sums
        .columns
        .iter()
        .map(|name| Series {
            name: name.clone(),
            values: sums.column(name).unwrap_or_default(),
            color: None,
        })
        .collect();
    Ok(chart(
        format!("Total {} and {} Amounts by {}", cols.credit, cols.debit, cols.account_type),
        Some(cols.account_type.clone()),
        Some("Transaction Amount".to_string()),
        Chart::StackedBar {
            categories: sums.keys,
            series,
        },
    ))
}

fn amount_correlation(data: &Dataset, config: &DashboardConfig) -> Result<SectionBody, DatasetError> {
    let cols = &config.columns;
    let matrix = aggregate::correlation_matrix(data, &cols.amounts())?;
    Ok(chart(
        format!("Correlation between {} and {}", cols.credit, cols.debit),
        None,
        None,
        Chart::Heatmap {
            rows: matrix.columns.clone(),
            columns: matrix.columns,
            cells: matrix.values,
            scale: HeatScale::Diverging { min: -1.0, max: 1.0 },
            decimals: 2,
        },
    ))
}
