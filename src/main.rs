use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use txnboard::config::DashboardConfig;
use txnboard::dashboard::{self, Task};
use txnboard::data::Dataset;
use txnboard::ir::Dashboard;
use txnboard::{graph, html, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "txnboard")]
#[command(about = "Render a static dashboard of banking transaction insights", long_about = None)]
struct Args {
    /// Transaction data (.csv, .xlsx, .json, or '-' for CSV on stdin)
    input: PathBuf,

    /// Dashboard HTML output
    #[arg(short, long, default_value = "dashboard.html")]
    output: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Row filter, e.g. `region = "North" and credit > 1000`
    #[arg(short, long)]
    filter: Option<String>,

    /// Render only these sections (repeatable)
    #[arg(long, value_enum)]
    only: Vec<Task>,

    /// Also export each chart as an image into this directory
    #[arg(long)]
    charts_dir: Option<PathBuf>,

    /// Image format for --charts-dir
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the aggregated dashboard data as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "txnboard=debug" } else { "txnboard=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if !args.only.is_empty() {
        config.tasks = args.only.clone();
    }
    if let Some(format) = args.format {
        config.render.format = format;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    config.validate()?;
    debug!(?config, "configuration loaded");

    let data = Dataset::load(&args.input)
        .with_context(|| format!("Failed to load '{}'", args.input.display()))?;

    let source = args.input.display().to_string();
    let board = dashboard::build_dashboard(&data, &source, args.filter.as_deref(), &config)?;

    html::save_dashboard(&args.output, &board, &config.render)?;
    info!("wrote dashboard to {}", args.output.display());

    if let Some(dir) = &args.charts_dir {
        export_charts(dir, &board, &config)?;
    }

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&board).context("Failed to serialize dashboard")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        info!("wrote dashboard data to {}", path.display());
    }

    Ok(())
}

fn export_charts(dir: &Path, board: &Dashboard, config: &DashboardConfig) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;

    for (idx, (section, figure)) in board.figures().enumerate() {
        let file = dir.join(format!(
            "{:02}-{}.{}",
            idx + 1,
            section.task.id(),
            config.render.format.extension()
        ));
        let bytes = graph::render(figure, &config.render)
            .with_context(|| format!("Failed to render '{}'", section.heading))?;
        std::fs::write(&file, bytes)
            .with_context(|| format!("Failed to write '{}'", file.display()))?;
        debug!("exported {}", file.display());
    }
    info!("exported charts to {}", dir.display());
    Ok(())
}
