use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use chess_season_stats::combine::combine_csv_files;
use chess_season_stats::logging;

/// Concatenate every CSV in a directory into DIR/combined.csv.
#[derive(Debug, Parser)]
struct Args {
    dir: PathBuf,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let summary = combine_csv_files(&args.dir)?;
    for file in &summary.files {
        println!("  {}", file.display());
    }
    println!(
        "{} rows, {} columns -> {}",
        summary.rows,
        summary.columns.len(),
        summary.path.display()
    );
    Ok(())
}
