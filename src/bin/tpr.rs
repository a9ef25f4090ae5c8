use anyhow::{Context, Result};
use clap::Parser;

use chess_season_stats::rating::{self, DEFAULT_THRESHOLD};

/// One-off tournament performance rating.
#[derive(Debug, Parser)]
struct Args {
    /// Points scored (wins + half draws).
    #[arg(long)]
    points: f64,
    /// Games played.
    #[arg(long)]
    games: u32,
    /// Average opponent rating.
    #[arg(long)]
    avg_opp: f64,
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let diff = rating::solve_rating_differential(args.points, args.games, args.threshold)
        .context("solve rating differential")?;
    let tpr = rating::estimate_performance_rating(diff, args.avg_opp);

    println!("Score: {}/{}", args.points, args.games);
    println!("Avg opponent: {:.1}", args.avg_opp);
    println!("Differential: {diff:+.1} (threshold {:.2})", args.threshold);
    println!("TPR: {tpr}");
    Ok(())
}
