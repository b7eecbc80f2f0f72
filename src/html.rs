// Standalone HTML dashboard with inline SVG charts

use crate::graph;
use crate::ir::{Dashboard, Preview, SectionBody};
use crate::RenderOptions;
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Render the dashboard as a single self-contained HTML page
pub fn write_dashboard(dashboard: &Dashboard, options: &RenderOptions) -> Result<String> {
    let mut html = String::with_capacity(256 * 1024);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(html, "<title>{}</title>", escape(&dashboard.title))?;
    writeln!(html, "<style>")?;
    writeln!(
        html,
        "body{{font-family:Arial,Helvetica,sans-serif;margin:20px;color:#222;background:#fff;}}"
    )?;
    writeln!(html, "h1{{margin:0 0 8px 0;font-size:26px;}}")?;
    writeln!(html, "h2{{margin:28px 0 8px 0;font-size:20px;}}")?;
    writeln!(html, ".meta{{color:#555;font-size:13px;margin-bottom:16px;}}")?;
    writeln!(
        html,
        ".preview{{border-collapse:collapse;font-size:12px;margin:8px 0 20px 0;}}"
    )?;
    writeln!(
        html,
        ".preview th,.preview td{{border:1px solid #ddd;padding:4px 8px;text-align:left;}}"
    )?;
    writeln!(html, ".preview th{{background:#f3f3f3;}}")?;
    writeln!(
        html,
        ".section{{border-top:1px solid #eee;padding-top:8px;}}"
    )?;
    writeln!(
        html,
        ".notice{{background:#fff8e1;border-left:4px solid #d98200;padding:8px 12px;max-width:800px;}}"
    )?;
    writeln!(html, "svg{{border:1px solid #e5e5e5;}}")?;
    writeln!(html, "</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    writeln!(html, "<h1>{}</h1>", escape(&dashboard.title))?;
    writeln!(html, "<p>{}</p>", escape(&dashboard.description))?;
    write!(
        html,
        "<div class=\"meta\">Source: <b>{}</b><br/>Rows: {}",
        escape(&dashboard.source),
        dashboard.row_count
    )?;
    if let Some(filter) = &dashboard.filter {
        write!(html, "<br/>Filter: <code>{}</code>", escape(filter))?;
    }
    writeln!(html, "</div>")?;

    writeln!(html, "<h2>Dataset Preview</h2>")?;
    preview_table(&mut html, &dashboard.preview)?;

    for section in &dashboard.sections {
        writeln!(
            html,
            "<div class=\"section\" id=\"{}\">",
            section.task.id()
        )?;
        writeln!(html, "<h2>{}</h2>", escape(&section.heading))?;
        match &section.body {
            SectionBody::Chart(figure) => {
                let svg = graph::render_svg(figure, options.width, options.height)
                    .with_context(|| format!("Failed to render '{}'", section.heading))?;
                writeln!(html, "{}", svg)?;
            }
            SectionBody::Notice(message) => {
                writeln!(html, "<p class=\"notice\">{}</p>", escape(message))?;
            }
        }
        writeln!(html, "</div>")?;
    }

    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;
    Ok(html)
}

/// Write the dashboard page to `path`
pub fn save_dashboard(path: &Path, dashboard: &Dashboard, options: &RenderOptions) -> Result<()> {
    let html = write_dashboard(dashboard, options)?;
    std::fs::write(path, html)
        .with_context(|| format!("Failed to write dashboard '{}'", path.display()))
}

fn preview_table(html: &mut String, preview: &Preview) -> Result<()> {
    if preview.rows.is_empty() {
        writeln!(html, "<p class=\"notice\">No rows to preview.</p>")?;
        return Ok(());
    }
    writeln!(html, "<table class=\"preview\">")?;
    write!(html, "<tr>")?;
    for header in &preview.headers {
        write!(html, "<th>{}</th>", escape(header))?;
    }
    writeln!(html, "</tr>")?;
    for row in &preview.rows {
        write!(html, "<tr>")?;
        for cell in row {
            write!(html, "<td>{}</td>", escape(cell))?;
        }
        writeln!(html, "</tr>")?;
    }
    writeln!(html, "</table>")?;
    Ok(())
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
