use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chess_season_stats::combine::combine_csv_files;
use chess_season_stats::config::{SingleSampleSpread, StatsConfig};
use chess_season_stats::logging;
use chess_season_stats::pipeline::{self, RunOutcome};

/// Per-player season statistics from an analysed games CSV.
#[derive(Debug, Parser)]
#[command(name = "player_stats")]
struct Args {
    /// Games CSV, or a directory of CSVs with --combine.
    input: PathBuf,
    /// Directory that receives player_stats.csv.
    output_dir: PathBuf,
    /// Concatenate every CSV in INPUT into INPUT/combined.csv first.
    #[arg(long)]
    combine: bool,
    /// Confidence threshold for the TPR solver, in (0, 1).
    #[arg(long)]
    threshold: Option<f64>,
    /// Variance/std for single-observation players: undefined or zero.
    #[arg(long)]
    single_sample: Option<SingleSampleSpread>,
    /// Abort the run when any TPR cannot be solved.
    #[arg(long)]
    strict_solver: bool,
    /// Also write player_stats.xlsx.
    #[arg(long)]
    xlsx: bool,
    /// Write the run summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let args = Args::parse();
    let mut cfg = StatsConfig::from_env()?;
    if let Some(threshold) = args.threshold {
        cfg.threshold = threshold;
    }
    if let Some(mode) = args.single_sample {
        cfg.single_sample_spread = mode;
    }
    cfg.strict_solver |= args.strict_solver;
    cfg.xlsx |= args.xlsx;
    cfg.validate()?;

    let input = if args.combine {
        if !args.input.is_dir() {
            println!("Input directory not found: {}", args.input.display());
            return Ok(());
        }
        let combined = combine_csv_files(&args.input)?;
        println!(
            "Combined {} files ({} rows) into {}",
            combined.files.len(),
            combined.rows,
            combined.path.display()
        );
        combined.path
    } else {
        args.input
    };

    let summary = match pipeline::run(&input, &args.output_dir, &cfg)? {
        RunOutcome::MissingInput(path) => {
            println!("Input file not found: {}", path.display());
            return Ok(());
        }
        RunOutcome::Completed(summary) => summary,
    };

    println!("Games: {}", summary.games);
    println!("Players: {}", summary.players);
    println!("Wrote {}", summary.output.display());
    if let Some(path) = &summary.xlsx_output {
        println!("Wrote {}", path.display());
    }
    if !summary.unsolved_tpr.is_empty() {
        println!(
            "TPR unsolved for {} player(s): {}",
            summary.unsolved_tpr.len(),
            summary.unsolved_tpr.join(", ")
        );
    }

    if let Some(path) = args.summary_json {
        let raw = serde_json::to_string_pretty(&summary).context("serialize run summary")?;
        fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
        println!("Summary: {}", path.display());
    }
    Ok(())
}
