//! Aggregation stage: group-by sums, counts, z-score scans, melted box
//! statistics, daily resampling and correlations.
//!
//! Every function reads a [`Dataset`] and returns plain, serializable data.
//! Nothing here knows about charts. Rows with a blank grouping key are left
//! out of every grouping.

use crate::data::Dataset;
use crate::error::DatasetError;
use crate::stats::{self, BoxStats};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Sums of several value columns per key; `sums[key][column]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSums {
    pub key_column: String,
    pub keys: Vec<String>,
    pub columns: Vec<String>,
    pub sums: Vec<Vec<f64>>,
}

impl GroupedSums {
    /// All sums of one value column, in key order
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))?;
        Some(self.sums.iter().map(|row| row[j]).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPair {
    pub group: String,
    pub item: String,
    pub total: f64,
}

/// Per-row values of one column and the rows whose |z| exceeds the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierScan {
    pub column: String,
    pub threshold: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// `(source row, value)` for every row
    pub points: Vec<(usize, f64)>,
    pub outliers: Vec<(usize, f64)>,
}

/// Box statistics of a long-format melt; `stats[variable][category]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroups {
    pub id_column: String,
    pub categories: Vec<String>,
    pub variables: Vec<String>,
    pub stats: Vec<Vec<Option<BoxStats>>>,
}

/// Calendar-day totals; `totals[column][day]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    pub days: Vec<NaiveDate>,
    pub columns: Vec<String>,
    pub totals: Vec<Vec<f64>>,
    /// Rows whose timestamp could not be parsed
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

fn ensure_rows(data: &Dataset) -> Result<(), DatasetError> {
    if data.is_empty() {
        Err(DatasetError::Empty)
    } else {
        Ok(())
    }
}

/// Occurrences of each distinct value; most frequent first, ties by name
pub fn value_counts(data: &Dataset, key: &str) -> Result<Vec<CategoryCount>, DatasetError> {
    let keys = data.text_column(key)?;
    ensure_rows(data)?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for k in keys.into_iter().filter(|k| !k.is_empty()) {
        *counts.entry(k).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    Ok(result)
}

/// Sum each value column per distinct key; keys in ascending order
pub fn group_sums(
    data: &Dataset,
    key: &str,
    values: &[&str],
) -> Result<GroupedSums, DatasetError> {
    let keys = data.text_column(key)?;
    let columns: Vec<Vec<f64>> = values
        .iter()
        .map(|v| data.numeric_column(v))
        .collect::<Result<_, _>>()?;
    ensure_rows(data)?;

    let mut acc: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (row, k) in keys.iter().enumerate() {
        if k.is_empty() {
            continue;
        }
        let entry = acc.entry(*k).or_insert_with(|| vec![0.0; columns.len()]);
        for (j, col) in columns.iter().enumerate() {
            entry[j] += col[row];
        }
    }
    if acc.is_empty() {
        return Err(DatasetError::Empty);
    }

    let (keys, sums): (Vec<String>, Vec<Vec<f64>>) =
        acc.into_iter().map(|(k, s)| (k.to_string(), s)).unzip();

    Ok(GroupedSums {
        key_column: key.to_string(),
        keys,
        columns: values.iter().map(|v| v.to_string()).collect(),
        sums,
    })
}

/// Sum `value` per (group, item), then keep the `n` largest items of each group.
/// Output is ordered by total descending across all groups.
pub fn top_n_per_group(
    data: &Dataset,
    group: &str,
    item: &str,
    value: &str,
    n: usize,
) -> Result<Vec<RankedPair>, DatasetError> {
    let groups = data.text_column(group)?;
    let items = data.text_column(item)?;
    let values = data.numeric_column(value)?;
    ensure_rows(data)?;

    let mut totals: HashMap<(&str, &str), f64> = HashMap::new();
    for ((g, i), v) in groups.iter().zip(&items).zip(&values) {
        if g.is_empty() || i.is_empty() {
            continue;
        }
        *totals.entry((*g, *i)).or_insert(0.0) += v;
    }
    if totals.is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut ranked: Vec<RankedPair> = totals
        .into_iter()
        .map(|((g, i), total)| RankedPair {
            group: g.to_string(),
            item: i.to_string(),
            total,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.item.cmp(&b.item))
    });

    let mut kept: HashMap<String, usize> = HashMap::new();
    ranked.retain(|pair| {
        let seen = kept.entry(pair.group.clone()).or_insert(0);
        *seen += 1;
        *seen <= n
    });
    Ok(ranked)
}

/// Flag rows whose standard score magnitude is strictly above `threshold`
pub fn zscore_outliers(
    data: &Dataset,
    column: &str,
    threshold: f64,
) -> Result<OutlierScan, DatasetError> {
    let values = data.numeric_column(column)?;
    ensure_rows(data)?;

    let z = stats::zscores(&values);
    let points: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (data.row_number(i), v))
        .collect();
    let outliers: Vec<(usize, f64)> = points
        .iter()
        .zip(&z)
        .filter(|(_, z)| z.abs() > threshold)
        .map(|(p, _)| *p)
        .collect();

    Ok(OutlierScan {
        column: column.to_string(),
        threshold,
        mean: stats::mean(&values),
        std_dev: stats::std_dev(&values),
        points,
        outliers,
    })
}

/// Melt `values` into long format keyed by `id`, then summarise each
/// (variable, category) sample as box statistics
pub fn melted_box_stats(
    data: &Dataset,
    id: &str,
    values: &[&str],
) -> Result<BoxGroups, DatasetError> {
    let ids = data.text_column(id)?;
    let columns: Vec<Vec<f64>> = values
        .iter()
        .map(|v| data.numeric_column(v))
        .collect::<Result<_, _>>()?;
    ensure_rows(data)?;

    let mut samples: BTreeMap<&str, Vec<Vec<f64>>> = BTreeMap::new();
    for (row, k) in ids.iter().enumerate() {
        if k.is_empty() {
            continue;
        }
        let per_var = samples
            .entry(*k)
            .or_insert_with(|| vec![Vec::new(); columns.len()]);
        for (j, col) in columns.iter().enumerate() {
            per_var[j].push(col[row]);
        }
    }

    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }

    let categories: Vec<String> = samples.keys().map(|k| k.to_string()).collect();
    let stats = (0..columns.len())
        .map(|j| {
            samples
                .values()
                .map(|per_var| BoxStats::from_values(&per_var[j]))
                .collect()
        })
        .collect();

    Ok(BoxGroups {
        id_column: id.to_string(),
        categories,
        variables: values.iter().map(|v| v.to_string()).collect(),
        stats,
    })
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y"];

/// Parse the timestamp layouts seen in spreadsheet exports
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Resample to calendar days: every day between the first and last parsed
/// timestamp is present, days without transactions total zero
pub fn daily_totals(
    data: &Dataset,
    time: &str,
    values: &[&str],
) -> Result<DailySeries, DatasetError> {
    let stamps = data.text_column(time)?;
    let columns: Vec<Vec<f64>> = values
        .iter()
        .map(|v| data.numeric_column(v))
        .collect::<Result<_, _>>()?;

    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    let mut dropped = 0;
    for (row, raw) in stamps.iter().enumerate() {
        let Some(ts) = parse_timestamp(raw) else {
            dropped += 1;
            continue;
        };
        let entry = by_day
            .entry(ts.date())
            .or_insert_with(|| vec![0.0; columns.len()]);
        for (j, col) in columns.iter().enumerate() {
            entry[j] += col[row];
        }
    }

    let (first, last) = match (by_day.keys().next(), by_day.keys().next_back()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(DatasetError::Empty),
    };

    let mut days = Vec::new();
    let mut totals = vec![Vec::new(); columns.len()];
    let mut day = first;
    loop {
        let sums = by_day.get(&day);
        for (j, series) in totals.iter_mut().enumerate() {
            series.push(sums.map(|s| s[j]).unwrap_or(0.0));
        }
        days.push(day);
        if day >= last {
            break;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, column = time, "rows without a parseable timestamp");
    }

    Ok(DailySeries {
        days,
        columns: values.iter().map(|v| v.to_string()).collect(),
        totals,
        dropped,
    })
}

/// Pairwise Pearson coefficients between numeric columns
pub fn correlation_matrix(
    data: &Dataset,
    values: &[&str],
) -> Result<CorrelationMatrix, DatasetError> {
    let columns: Vec<Vec<f64>> = values
        .iter()
        .map(|v| data.numeric_column(v))
        .collect::<Result<_, _>>()?;
    ensure_rows(data)?;

    let matrix = columns
        .iter()
        .map(|a| columns.iter().map(|b| stats::pearson(a, b)).collect())
        .collect();

    Ok(CorrelationMatrix {
        columns: values.iter().map(|v| v.to_string()).collect(),
        values: matrix,
    })
}
