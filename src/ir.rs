use crate::dashboard::Task;
use crate::stats::BoxStats;
use chrono::NaiveDate;
use serde::Serialize;

// =============================================================================
// Chart IR: exactly the aggregated data handed to the renderer
// =============================================================================

/// A titled chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub chart: Chart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chart {
    /// Share of each category; labelled with percentages
    Pie { slices: Vec<Slice> },
    /// Side-by-side bars, one bar per series within each category
    GroupedBar {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    /// Series stacked on top of each other within each category
    StackedBar {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    /// Annotated grid of values; `cells[row][column]`
    Heatmap {
        rows: Vec<String>,
        columns: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
        scale: HeatScale,
        decimals: usize,
    },
    Scatter { layers: Vec<PointLayer> },
    /// `series[i].stats[j]` summarises variable i in category j
    Boxplot {
        categories: Vec<String>,
        series: Vec<BoxSeries>,
    },
    TimeSeries {
        days: Vec<NaiveDate>,
        series: Vec<Series>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

/// Named values aligned with the chart's categories (or days)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    /// Fixed color; palette order when `None`
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLayer {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub color: Option<String>,
    pub alpha: f64,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSeries {
    pub name: String,
    pub stats: Vec<Option<BoxStats>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeatScale {
    /// YlGnBu stretched over the observed min..max
    Sequential,
    /// Blue-white-red over a fixed symmetric domain
    Diverging { min: f64, max: f64 },
}

// =============================================================================
// Dashboard document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub task: Task,
    pub heading: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum SectionBody {
    Chart(Figure),
    /// Fallback message shown instead of a chart
    Notice(String),
}

/// First rows of the (filtered) dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub description: String,
    pub source: String,
    pub filter: Option<String>,
    pub row_count: usize,
    pub preview: Preview,
    pub sections: Vec<Section>,
}

impl Dashboard {
    pub fn figures(&self) -> impl Iterator<Item = (&Section, &Figure)> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Chart(f) => Some((s, f)),
            SectionBody::Notice(_) => None,
        })
    }
}
