//! # ttsobol-piston
//!
//! Sensitivity analysis of the piston cycle time model: builds the metrics,
//! prints the report tables and a few queries, and optionally exports the
//! tables as TSV files.

mod piston;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ttsobol::{
    build_metrics, query, tabulate, IndexFamily, QueryResult, SelectionMode, SensitivityConfig,
    SensitivityMetrics, SobolQuery, TableFormat,
};

/// Perform sensitivity analysis of a chain of nonlinear functions simulating
/// the circular motion of a piston within a cylinder.
#[derive(Parser, Debug)]
#[command(name = "ttsobol-piston", version, about)]
struct Cli {
    /// Random seed (default: not set)
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose mode
    #[arg(long)]
    verbose: bool,

    /// Number of samples for each input axis
    #[arg(short, long, default_value_t = 100)]
    bins: usize,

    /// Maximum order of the collected indices
    #[arg(long, default_value_t = 2)]
    order: usize,

    /// Export result tables as piston_<report>.tsv
    #[arg(long)]
    export: bool,

    /// Directory for exported tables
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Cross approximation tolerance
    #[arg(long, default_value_t = 1e-5)]
    eps: f64,

    /// Maximum number of sweeps
    #[arg(long, default_value_t = 20)]
    max_sweeps: usize,
}

fn format_result(metrics: &SensitivityMetrics, result: &QueryResult) -> String {
    let entries: Vec<String> = result
        .iter()
        .map(|(s, v)| format!("{} {v:.6}", s.display_names(metrics.variables())))
        .collect();
    format!("[{}]", entries.join(", "))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    println!("ttsobol example: piston cycle time sensitivity analysis\n");
    if cli.verbose {
        println!("{cli:#?}");
    }

    let catalog = piston::catalog()?;
    let mut config = SensitivityConfig::default()
        .with_bins(cli.bins)
        .with_max_order(cli.order)
        .with_eps(cli.eps)
        .with_max_sweeps(cli.max_sweeps)
        .with_verbose(cli.verbose);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    println!("+ Computing tensor approximations of variance-based sensitivity metrics...");
    let metrics = build_metrics(piston::cycle_time, &catalog, &config)?;
    info!(
        seed = metrics.seed(),
        evaluations = metrics.evaluations(),
        rank = metrics.surrogate().rank(),
        "metrics ready"
    );
    println!(
        "    mean {:.6}, std dev {:.6}, {} model evaluations\n",
        metrics.mean(),
        metrics.std_dev(),
        metrics.evaluations()
    );

    let tables = tabulate(&metrics, cli.order, TableFormat::Plain);
    for (name, table) in &tables {
        println!("{name}:\n{table}");
    }

    println!("+ Querying computed sensitivity metrics...");
    println!("    Model variables: {:?}", metrics.variables());
    let queries = [
        (
            "Highest order-2 total index",
            SobolQuery::new(IndexFamily::Total)
                .with_min_order(1)
                .with_max_order(2),
        ),
        (
            "Lowest order-1 closed index",
            SobolQuery::new(IndexFamily::Closed)
                .with_min_order(1)
                .with_mode(SelectionMode::Lowest),
        ),
        (
            "Highest order-2 superset index, other than T_a",
            SobolQuery::new(IndexFamily::Superset)
                .with_min_order(1)
                .exclude("T_a")
                .with_max_order(2),
        ),
        (
            "Single variable that interacts the most with S",
            SobolQuery::new(IndexFamily::Superset)
                .include("S")
                .with_min_order(2)
                .with_max_order(2),
        ),
    ];
    for (label, q) in &queries {
        let result = query(&metrics, q)?;
        println!("\t - {label}: {}", format_result(&metrics, &result));
    }
    println!();

    if cli.export {
        println!("+ Exporting result tables...");
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("creating {}", cli.out_dir.display()))?;
        let format = TableFormat::Tsv;
        for (name, table) in tabulate(&metrics, cli.order, format) {
            let path = cli
                .out_dir
                .join(format!("piston_{name}.{}", format.extension()));
            fs::write(&path, table).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "exported table");
        }
    }

    Ok(())
}
