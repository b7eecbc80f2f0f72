// Rendering stage: draw chart IR with plotters onto SVG or PNG canvases

use crate::ir::{BoxSeries, Chart, Figure, HeatScale, PointLayer, Series, Slice};
use crate::palette::{contrast_text, parse_color, ColorPalette, Gradient};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use image::ImageEncoder;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

type Chart2d<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const FONT: &str = "sans-serif";

/// Upper bound on the RGB buffer behind a PNG export (about 16k x 16k)
const MAX_PNG_BYTES: usize = 16_384 * 16_384 * 3;

/// Render a figure as an SVG document
pub fn render_svg(figure: &Figure, width: u32, height: u32) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

/// Render a figure as PNG bytes
pub fn render_png(figure: &Figure, width: u32, height: u32) -> Result<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(3))
        .filter(|&len| len <= MAX_PNG_BYTES)
        .ok_or_else(|| anyhow::anyhow!("Image size {}x{} is too large for PNG output", width, height))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

/// Render in the configured output format
pub fn render(figure: &Figure, options: &RenderOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Png => render_png(figure, options.width, options.height),
        OutputFormat::Svg => render_svg(figure, options.width, options.height).map(String::into_bytes),
    }
}

fn draw_figure<DB>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    match &figure.chart {
        Chart::Pie { slices } => draw_pie(root, &figure.title, slices),
        Chart::GroupedBar { categories, series } => {
            draw_bars(root, figure, categories, series, BarLayout::Dodge)
        }
        Chart::StackedBar { categories, series } => {
            draw_bars(root, figure, categories, series, BarLayout::Stack)
        }
        Chart::Heatmap {
            rows,
            columns,
            cells,
            scale,
            decimals,
        } => draw_heatmap(root, figure, rows, columns, cells, *scale, *decimals),
        Chart::Scatter { layers } => draw_scatter(root, figure, layers),
        Chart::Boxplot { categories, series } => draw_boxplot(root, figure, categories, series),
        Chart::TimeSeries { days, series } => draw_time_series(root, figure, days, series),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

fn cartesian<'a, DB>(
    root: &'a DrawingArea<DB, Shift>,
    title: &str,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart2d<'a, DB>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ChartBuilder::on(root)
        .margin(10)
        .caption(title, (FONT, 22))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x, y)
        .context("Failed to build chart")
}

fn draw_legend<'a, DB>(chart: &mut Chart2d<'a, DB>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, 13))
        .draw()
        .context("Failed to draw legend")
}

fn series_color(palette: &ColorPalette, index: usize, fixed: Option<&str>) -> RGBColor {
    fixed.and_then(parse_color).unwrap_or_else(|| palette.color(index))
}

/// Pad a continuous range by 5%; widen a degenerate one by ±1
pub fn pad_range(min: f64, max: f64) -> Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Value range for bars: always includes the zero baseline
pub fn bar_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min == max {
        return 0.0..1.0;
    }
    let padding = (max - min) * 0.05;
    let lo = if min < 0.0 { min - padding } else { 0.0 };
    let hi = if max > 0.0 { max + padding } else { 0.0 };
    lo..hi
}

fn min_max(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Axis label for a category slot; slots sit at integer positions
fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

/// Compact tick label for currency amounts
pub fn format_amount(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if abs >= 1e4 {
        format!("{:.0}K", v / 1e3)
    } else if abs >= 100.0 || v == v.trunc() {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn centered(size: u32, color: RGBColor) -> TextStyle<'static> {
    TextStyle {
        font: (FONT, size as f64).into_font(),
        color: color.to_backend_color(),
        pos: Pos::new(HPos::Center, VPos::Center),
    }
}

// =============================================================================
// Pie
// =============================================================================

fn draw_pie<DB>(root: &DrawingArea<DB, Shift>, title: &str, slices: &[Slice]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    if slices.is_empty() || total <= 0.0 {
        anyhow::bail!("Cannot draw a pie chart without positive values");
    }

    let area = root
        .titled(title, (FONT, 22))
        .context("Failed to draw title")?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64) * 0.38;
    let palette = ColorPalette::tab20();

    // Counter-clockwise from 12 o'clock
    let mut start = 90.0_f64;
    for (idx, slice) in slices.iter().enumerate() {
        let fraction = slice.value.max(0.0) / total;
        let sweep = fraction * 360.0;
        let end = start + sweep;
        let color = palette.color(idx);

        let steps = (sweep.ceil() as usize).max(2);
        let mut points = Vec::with_capacity(steps + 2);
        points.push((center.0 as i32, center.1 as i32));
        for step in 0..=steps {
            let angle = (start + sweep * step as f64 / steps as f64).to_radians();
            points.push(polar(center, radius, angle));
        }
        area.draw(&Polygon::new(points, color.filled()))
            .context("Failed to draw pie wedge")?;

        let mid = ((start + end) / 2.0).to_radians();
        area.draw(&Text::new(
            format!("{:.1}%", fraction * 100.0),
            polar(center, radius * 0.6, mid),
            centered(13, contrast_text(color)),
        ))
        .context("Failed to draw pie percentage")?;
        area.draw(&Text::new(
            slice.label.clone(),
            polar(center, radius * 1.12, mid),
            centered(14, BLACK),
        ))
        .context("Failed to draw pie label")?;

        start = end;
    }

    Ok(())
}

fn polar(center: (f64, f64), radius: f64, angle: f64) -> (i32, i32) {
    (
        (center.0 + radius * angle.cos()).round() as i32,
        (center.1 - radius * angle.sin()).round() as i32,
    )
}

// =============================================================================
// Bars
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum BarLayout {
    Dodge,
    Stack,
}

fn draw_bars<DB>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    categories: &[String],
    series: &[Series],
    layout: BarLayout,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if categories.is_empty() {
        anyhow::bail!("Cannot create bar chart with no categories");
    }
    if series.is_empty() {
        anyhow::bail!("Cannot create bar chart with no series");
    }
    if let Some(bad) = series.iter().find(|s| s.values.len() != categories.len()) {
        anyhow::bail!(
            "Series '{}' has {} values for {} categories",
            bad.name,
            bad.values.len(),
            categories.len()
        );
    }

    let y_range = match layout {
        BarLayout::Dodge => bar_range(series.iter().flat_map(|s| s.values.iter().copied())),
        BarLayout::Stack => bar_range(
            (0..categories.len()).map(|i| series.iter().map(|s| s.values[i]).sum::<f64>()),
        ),
    };
    let n = categories.len();
    let mut chart = cartesian(root, &figure.title, -0.5..(n as f64 - 0.5), y_range)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| category_label(categories, *x))
        .y_label_formatter(&|y| format_amount(*y))
        .x_desc(figure.x_label.clone().unwrap_or_default())
        .y_desc(figure.y_label.clone().unwrap_or_default())
        .axis_desc_style((FONT, 15))
        .draw()
        .context("Failed to draw mesh")?;

    let palette = ColorPalette::tab10();
    let num_series = series.len();

    match layout {
        BarLayout::Dodge => {
            // Side-by-side bars
            let bar_width = 0.8 / num_series as f64;
            for (series_idx, s) in series.iter().enumerate() {
                let color = series_color(&palette, series_idx, s.color.as_deref());
                let x_offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width;
                chart
                    .draw_series(s.values.iter().enumerate().map(|(cat_idx, &y_val)| {
                        let x_center = cat_idx as f64 + x_offset;
                        Rectangle::new(
                            [
                                (x_center - bar_width / 2.0, 0.0),
                                (x_center + bar_width / 2.0, y_val),
                            ],
                            color.filled(),
                        )
                    }))
                    .context("Failed to draw bars")?
                    .label(s.name.clone())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }
        }
        BarLayout::Stack => {
            // Stacked bars
            let bar_width = 0.8;
            let mut cumulative = vec![0.0; n];
            for (series_idx, s) in series.iter().enumerate() {
                let color = series_color(&palette, series_idx, s.color.as_deref());
                let bases = cumulative.clone();
                chart
                    .draw_series(s.values.iter().enumerate().map(|(cat_idx, &y_val)| {
                        let x_center = cat_idx as f64;
                        Rectangle::new(
                            [
                                (x_center - bar_width / 2.0, bases[cat_idx]),
                                (x_center + bar_width / 2.0, bases[cat_idx] + y_val),
                            ],
                            color.filled(),
                        )
                    }))
                    .context("Failed to draw bars")?
                    .label(s.name.clone())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
                for (acc, v) in cumulative.iter_mut().zip(&s.values) {
                    *acc += v;
                }
            }
        }
    }

    draw_legend(&mut chart)
}

// =============================================================================
// Heatmap
// =============================================================================

fn draw_heatmap<DB>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    rows: &[String],
    columns: &[String],
    cells: &[Vec<Option<f64>>],
    scale: HeatScale,
    decimals: usize,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if rows.is_empty() || columns.is_empty() {
        anyhow::bail!("Cannot create heatmap with no cells");
    }
    if cells.len() != rows.len() || cells.iter().any(|r| r.len() != columns.len()) {
        anyhow::bail!("Heatmap cells do not match {}x{} labels", rows.len(), columns.len());
    }

    let (gradient, lo, hi) = match scale {
        HeatScale::Sequential => {
            let (lo, hi) = min_max(cells.iter().flatten().flatten().copied());
            (Gradient::yl_gn_bu(), lo, hi)
        }
        HeatScale::Diverging { min, max } => (Gradient::diverging(), min, max),
    };
    let normalize = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };

    let nrows = rows.len();
    let ncols = columns.len();
    let mut chart = cartesian(
        root,
        &figure.title,
        -0.5..(ncols as f64 - 0.5),
        -0.5..(nrows as f64 - 0.5),
    )?;

    // Row 0 at the top
    let y_labels: Vec<String> = rows.iter().rev().cloned().collect();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(ncols)
        .y_labels(nrows)
        .x_label_formatter(&|x| category_label(columns, *x))
        .y_label_formatter(&|y| category_label(&y_labels, *y))
        .x_desc(figure.x_label.clone().unwrap_or_default())
        .y_desc(figure.y_label.clone().unwrap_or_default())
        .axis_desc_style((FONT, 15))
        .draw()
        .context("Failed to draw mesh")?;

    let missing = RGBColor(230, 230, 230);
    for (r, row) in cells.iter().enumerate() {
        let y = (nrows - 1 - r) as f64;
        for (c, cell) in row.iter().enumerate() {
            let x = c as f64;
            let fill = cell.map(|v| gradient.at(normalize(v))).unwrap_or(missing);
            let label = match cell {
                Some(v) => format!("{:.*}", decimals, v),
                None => "n/a".to_string(),
            };
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    fill.filled(),
                )))
                .context("Failed to draw heatmap cell")?;
            chart
                .draw_series(std::iter::once(Text::new(
                    label,
                    (x, y),
                    centered(14, contrast_text(fill)),
                )))
                .context("Failed to annotate heatmap cell")?;
        }
    }

    Ok(())
}

// =============================================================================
// Scatter
// =============================================================================

fn draw_scatter<DB>(root: &DrawingArea<DB, Shift>, figure: &Figure, layers: &[PointLayer]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let all = layers.iter().flat_map(|l| l.points.iter());
    let (x_min, x_max) = min_max(all.clone().map(|p| p.0));
    let (y_min, y_max) = min_max(all.map(|p| p.1));
    if !x_min.is_finite() {
        anyhow::bail!("Cannot create scatter plot with no data points");
    }

    let mut chart = cartesian(root, &figure.title, pad_range(x_min, x_max), pad_range(y_min, y_max))?;
    chart
        .configure_mesh()
        .y_label_formatter(&|y| format_amount(*y))
        .x_desc(figure.x_label.clone().unwrap_or_default())
        .y_desc(figure.y_label.clone().unwrap_or_default())
        .axis_desc_style((FONT, 15))
        .draw()
        .context("Failed to draw mesh")?;

    let palette = ColorPalette::tab10();
    for (idx, layer) in layers.iter().enumerate() {
        let color = series_color(&palette, idx, layer.color.as_deref());
        let style = color.mix(layer.alpha).filled();
        let size = layer.size;
        chart
            .draw_series(layer.points.iter().map(|&(x, y)| Circle::new((x, y), size, style)))
            .context("Failed to draw point series")?
            .label(layer.name.clone())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    draw_legend(&mut chart)
}

// =============================================================================
// Boxplot
// =============================================================================

fn draw_boxplot<DB>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    categories: &[String],
    series: &[BoxSeries],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let extents = series.iter().flat_map(|s| s.stats.iter().flatten()).flat_map(|b| {
        b.outliers
            .iter()
            .copied()
            .chain([b.lower_whisker, b.upper_whisker])
    });
    let (y_min, y_max) = min_max(extents);
    if categories.is_empty() || !y_min.is_finite() {
        anyhow::bail!("Cannot create box plot with no data");
    }

    let n = categories.len();
    let mut chart = cartesian(root, &figure.title, -0.5..(n as f64 - 0.5), pad_range(y_min, y_max))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| category_label(categories, *x))
        .y_label_formatter(&|y| format_amount(*y))
        .x_desc(figure.x_label.clone().unwrap_or_default())
        .y_desc(figure.y_label.clone().unwrap_or_default())
        .axis_desc_style((FONT, 15))
        .draw()
        .context("Failed to draw mesh")?;

    let palette = ColorPalette::tab10();
    let num_series = series.len().max(1);
    let slot = 0.8 / num_series as f64;
    let half = slot * 0.4;
    let cap = slot * 0.2;

    for (series_idx, s) in series.iter().enumerate() {
        let color = palette.color(series_idx);
        let offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * slot;
        let boxes: Vec<(f64, &crate::stats::BoxStats)> = s
            .stats
            .iter()
            .enumerate()
            .filter_map(|(cat_idx, b)| b.as_ref().map(|b| (cat_idx as f64 + offset, b)))
            .collect();

        chart
            .draw_series(boxes.iter().map(|&(x, b)| {
                Rectangle::new([(x - half, b.q1), (x + half, b.q3)], color.mix(0.7).filled())
            }))
            .context("Failed to draw boxes")?
            .label(s.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

        let outline = BLACK.stroke_width(1);
        chart
            .draw_series(boxes.iter().map(|&(x, b)| {
                Rectangle::new([(x - half, b.q1), (x + half, b.q3)], outline)
            }))
            .context("Failed to draw box outlines")?;

        let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
        for &(x, b) in &boxes {
            segments.push(vec![(x - half, b.median), (x + half, b.median)]);
            segments.push(vec![(x, b.lower_whisker), (x, b.q1)]);
            segments.push(vec![(x, b.q3), (x, b.upper_whisker)]);
            segments.push(vec![(x - cap, b.lower_whisker), (x + cap, b.lower_whisker)]);
            segments.push(vec![(x - cap, b.upper_whisker), (x + cap, b.upper_whisker)]);
        }
        chart
            .draw_series(segments.into_iter().map(|pts| PathElement::new(pts, outline)))
            .context("Failed to draw whiskers")?;

        chart
            .draw_series(boxes.iter().flat_map(|&(x, b)| {
                b.outliers
                    .iter()
                    .map(move |&v| Circle::new((x, v), 3, BLACK.stroke_width(1)))
            }))
            .context("Failed to draw outliers")?;
    }

    draw_legend(&mut chart)
}

// =============================================================================
// Time series
// =============================================================================

fn draw_time_series<DB>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    days: &[NaiveDate],
    series: &[Series],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if days.is_empty() {
        anyhow::bail!("Cannot create time series with no days");
    }

    let (y_min, y_max) = min_max(series.iter().flat_map(|s| s.values.iter().copied()));
    let x_range = pad_range(0.0, (days.len() - 1) as f64);
    let mut chart = cartesian(root, &figure.title, x_range, pad_range(y_min.min(0.0), y_max))?;

    let labels: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    chart
        .configure_mesh()
        .x_labels(days.len().min(8))
        .x_label_formatter(&|x| category_label(&labels, *x))
        .y_label_formatter(&|y| format_amount(*y))
        .x_desc(figure.x_label.clone().unwrap_or_default())
        .y_desc(figure.y_label.clone().unwrap_or_default())
        .axis_desc_style((FONT, 15))
        .draw()
        .context("Failed to draw mesh")?;

    let palette = ColorPalette::tab10();
    for (idx, s) in series.iter().enumerate() {
        let color = series_color(&palette, idx, s.color.as_deref());
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .context("Failed to draw line series")?
            .label(s.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2)));
    }

    draw_legend(&mut chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::BoxStats;

    fn figure(chart: Chart) -> Figure {
        Figure {
            title: "Test".to_string(),
            x_label: Some("X".to_string()),
            y_label: Some("Y".to_string()),
            chart,
        }
    }

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    #[test]
    fn test_pad_range() {
        assert_eq!(pad_range(5.0, 5.0), 4.0..6.0);
        assert_eq!(pad_range(0.0, 100.0), -5.0..105.0);
        assert_eq!(pad_range(f64::INFINITY, f64::NEG_INFINITY), 0.0..1.0);
    }

    #[test]
    fn test_bar_range_includes_zero() {
        assert_eq!(bar_range([10.0, 20.0]), 0.0..21.0);
        assert_eq!(bar_range([-10.0, -20.0]), -21.0..0.0);
        assert_eq!(bar_range([0.0]), 0.0..1.0);
    }

    #[test]
    fn test_category_label() {
        let cats = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&cats, 0.0), "A");
        assert_eq!(category_label(&cats, 1.0), "B");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 2.0), "");
        assert_eq!(category_label(&cats, -1.0), "");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(2.5), "2.50");
        assert_eq!(format_amount(950.0), "950");
        assert_eq!(format_amount(25_000.0), "25K");
        assert_eq!(format_amount(1_500_000.0), "1.5M");
        assert_eq!(format_amount(-2_000_000_000.0), "-2.0B");
    }

    #[test]
    fn test_render_pie_svg() {
        let fig = figure(Chart::Pie {
            slices: vec![
                Slice { label: "Savings".to_string(), value: 3.0 },
                Slice { label: "Current".to_string(), value: 1.0 },
            ],
        });
        let svg = render_svg(&fig, 400, 300).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("75.0%"));
        assert!(svg.contains("Savings"));
    }

    #[test]
    fn test_render_pie_rejects_zero_total() {
        let fig = figure(Chart::Pie {
            slices: vec![Slice { label: "A".to_string(), value: 0.0 }],
        });
        assert!(render_svg(&fig, 400, 300).is_err());
    }

    #[test]
    fn test_render_grouped_bar_png() {
        let fig = figure(Chart::GroupedBar {
            categories: vec!["HBL".to_string(), "UBL".to_string()],
            series: vec![
                Series { name: "North".to_string(), values: vec![10.0, 20.0], color: None },
                Series { name: "South".to_string(), values: vec![5.0, 0.0], color: Some("red".to_string()) },
            ],
        });
        let png = render_png(&fig, 400, 300).unwrap();
        assert!(is_valid_png(&png));
    }

    #[test]
    fn test_render_stacked_bar_svg() {
        let fig = figure(Chart::StackedBar {
            categories: vec!["Savings".to_string()],
            series: vec![
                Series { name: "Credit".to_string(), values: vec![10.0], color: None },
                Series { name: "Debit".to_string(), values: vec![15.0], color: None },
            ],
        });
        let svg = render_svg(&fig, 400, 300).unwrap();
        assert!(svg.contains("Credit"));
        assert!(svg.contains("Debit"));
    }

    #[test]
    fn test_render_bar_length_mismatch() {
        let fig = figure(Chart::GroupedBar {
            categories: vec!["A".to_string(), "B".to_string()],
            series: vec![Series { name: "s".to_string(), values: vec![1.0], color: None }],
        });
        let err = render_svg(&fig, 400, 300).unwrap_err();
        assert!(err.to_string().contains("1 values for 2 categories"));
    }

    #[test]
    fn test_render_heatmap_annotations() {
        let fig = figure(Chart::Heatmap {
            rows: vec!["North".to_string(), "South".to_string()],
            columns: vec!["Credit".to_string(), "Debit".to_string()],
            cells: vec![vec![Some(400.0), Some(10.0)], vec![Some(550.0), None]],
            scale: HeatScale::Sequential,
            decimals: 2,
        });
        let svg = render_svg(&fig, 500, 400).unwrap();
        assert!(svg.contains("400.00"));
        assert!(svg.contains("550.00"));
        assert!(svg.contains("n/a"));
    }

    #[test]
    fn test_render_scatter_png() {
        let fig = figure(Chart::Scatter {
            layers: vec![PointLayer {
                name: "Credit".to_string(),
                points: vec![(0.0, 1.0), (1.0, 3.0)],
                color: None,
                alpha: 0.5,
                size: 3,
            }],
        });
        assert!(is_valid_png(&render_png(&fig, 400, 300).unwrap()));
    }

    #[test]
    fn test_render_scatter_empty() {
        let fig = figure(Chart::Scatter { layers: vec![] });
        assert!(render_png(&fig, 400, 300).is_err());
    }

    #[test]
    fn test_render_boxplot_svg() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 50.0]);
        let fig = figure(Chart::Boxplot {
            categories: vec!["Savings".to_string(), "Current".to_string()],
            series: vec![BoxSeries {
                name: "Credit".to_string(),
                stats: vec![stats, None],
            }],
        });
        let svg = render_svg(&fig, 400, 300).unwrap();
        assert!(svg.contains("Savings"));
    }

    #[test]
    fn test_render_png_rejects_oversized_canvas() {
        let fig = figure(Chart::Pie {
            slices: vec![Slice { label: "A".to_string(), value: 1.0 }],
        });
        let err = render_png(&fig, 40_000, 40_000).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(render_png(&fig, u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_render_time_series() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let fig = figure(Chart::TimeSeries {
            days: vec![day, day.succ_opt().unwrap()],
            series: vec![Series {
                name: "Credit".to_string(),
                values: vec![100.0, 50.0],
                color: Some("blue".to_string()),
            }],
        });
        let svg = render_svg(&fig, 400, 300).unwrap();
        assert!(svg.contains("2024-01-01"));

        let options = RenderOptions { width: 400, height: 300, format: OutputFormat::Png };
        assert!(is_valid_png(&render(&fig, &options).unwrap()));
    }
}
