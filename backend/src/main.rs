//! Transitclean CLI - Clean Transjakarta smart-card transactions
//!
//! # Main Commands
//!
//! ```bash
//! transitclean serve                 # Start HTTP server (port 3000)
//! transitclean report --pretty       # Full report as JSON
//! transitclean -i april.csv clean    # Cleaned rows of another export
//! ```
//!
//! # Stage Commands
//!
//! ```bash
//! transitclean describe              # Raw preview, info, describe, unique values
//! transitclean audit                 # Missing % per column and duplicate rows
//! transitclean summary --seed 7      # Post-clean feature summary
//! transitclean charts                # Sex and payAmount value counts
//! ```
//!
//! JSON goes to stdout, progress logs to stderr.

use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use transitclean::{
    audit, chart_data, clean_table, columns::RAW, data_summary, describe, parse_file_auto,
    parser::require_columns, run_file, AppConfig, CleaningStats, Table,
};

#[derive(Parser)]
#[command(name = "transitclean")]
#[command(about = "Clean and summarize Transjakarta transaction exports", long_about = None)]
struct Cli {
    /// Input CSV file (default: TRANSITCLEAN_INPUT or Transjakarta.csv)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the raw table
    Describe,

    /// Missing-value shares and duplicate-row count of the raw table
    Audit,

    /// Run the cleaning steps and output cleaned rows
    Clean {
        /// Number of rows to output
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Post-clean feature summary
    Summary {
        /// Seed for the unique-value samples (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Value counts for the sex and payAmount charts
    Charts,

    /// Full pipeline report
    Report {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: TRANSITCLEAN_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanOutput {
    stats: CleaningStats,
    rows: Table,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match AppConfig::from_env() {
        Ok(config) => {
            let port = match &cli.command {
                Commands::Serve { port } => *port,
                _ => None,
            };
            let config = config.with_overrides(cli.input, port);
            dispatch(cli.command, config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let input = config.input_path.clone();

    match command {
        Commands::Describe => cmd_describe(&input),
        Commands::Audit => cmd_audit(&input),
        Commands::Clean { limit } => cmd_clean(&input, limit),
        Commands::Summary { seed } => cmd_summary(&input, seed),
        Commands::Charts => cmd_charts(&input),
        Commands::Report { pretty } => cmd_report(&input, pretty),
        Commands::Serve { .. } => cmd_serve(config).await,
    }
}

fn cmd_describe(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Describing: {}", input.display());

    let parsed = parse_file_auto(input)?;
    eprintln!("{}", transitclean::info(&parsed.table));

    write_json(&describe(&parsed.table), true)
}

fn cmd_audit(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Auditing: {}", input.display());

    let parsed = parse_file_auto(input)?;
    let report = audit(&parsed.table);
    eprintln!("   Duplicate rows: {}", report.duplicate_rows);

    write_json(&report, true)
}

fn cmd_clean(input: &Path, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let (table, stats) = load_cleaned(input)?;
    eprintln!("✨ {} rows, {} columns", table.n_rows(), table.n_cols());

    let output = CleanOutput {
        stats,
        rows: table.head(limit),
    };
    write_json(&output, true)
}

fn cmd_summary(input: &Path, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let (table, _) = load_cleaned(input)?;

    let summary = match seed {
        Some(seed) => data_summary(&table, &mut StdRng::seed_from_u64(seed)),
        None => data_summary(&table, &mut rand::thread_rng()),
    };
    write_json(&summary, true)
}

fn cmd_charts(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (table, _) = load_cleaned(input)?;
    write_json(&chart_data(&table)?, true)
}

fn cmd_report(input: &Path, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let output = run_file(input)?;
    eprintln!("\n✨ Done! Run {}", output.report.run_id);
    println!("{}", output.report.to_json(pretty)?);
    Ok(())
}

async fn cmd_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    transitclean::server::start_server(config).await?;
    Ok(())
}

/// Load the input and run the cleaning steps without the rest of the report.
fn load_cleaned(input: &Path) -> Result<(Table, CleaningStats), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let parsed = parse_file_auto(input)?;
    require_columns(&parsed.table, &RAW)?;

    let mut table = parsed.table;
    let stats = clean_table(&mut table)?;
    eprintln!(
        "   {} rows in, {} duplicates removed, {} rows out",
        stats.rows_in, stats.duplicates_removed, stats.rows_out
    );
    Ok((table, stats))
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
