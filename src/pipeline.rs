//! Games in, one row per player out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{
    Dispersion, PlayerTable, count_by_player, dispersion_by_player, mean_by_player,
    pooled_observations, sum_by_player,
};
use crate::config::{SingleSampleSpread, StatsConfig};
use crate::derived::{MetricDispersion, PlayerSums};
use crate::error::{StatsError, StatsResult};
use crate::game_table::{GameRecord, GameTable, Metric, Side};
use crate::join::{Joiner, full_outer_join_on_player};
use crate::player_stats::{self, PlayerStats, sort_by_avg_gi_desc};
use crate::rating;

/// Rows ready to be written, plus the players whose TPR could not be solved.
#[derive(Debug, Clone)]
pub struct StatsTable {
    pub rows: Vec<PlayerStats>,
    pub unsolved_tpr: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub xlsx_output: Option<PathBuf>,
    pub games: usize,
    pub players: usize,
    pub unsolved_tpr: Vec<String>,
    pub config: StatsConfig,
    pub generated_at: String,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The input path did not exist; nothing was written.
    MissingInput(PathBuf),
    Completed(RunSummary),
}

/// Joins every per-colour partial aggregate into one wide row per player.
pub fn aggregate_player_sums(games: &[GameRecord]) -> PlayerTable<PlayerSums> {
    use Side::{Black, White};

    let mut joiner = Joiner::<PlayerSums>::new()
        .join(&count_by_player(games, White), |r, v| r.white_games = v)
        .join(&count_by_player(games, Black), |r, v| r.black_games = v)
        .join(
            &sum_by_player(games, White, |g| u64::from(White.moves(g))),
            |r, v| r.white_moves = v,
        )
        .join(
            &sum_by_player(games, Black, |g| u64::from(Black.moves(g))),
            |r, v| r.black_moves = v,
        )
        .join(&sum_by_player(games, White, |g| White.result(g)), |r, v| {
            r.white_result_sum = v
        })
        .join(&sum_by_player(games, Black, |g| Black.result(g)), |r, v| {
            r.black_result_sum = v
        })
        .join(&mean_by_player(games, White, |g| White.elo(g)), |r, v| {
            r.white_avg_elo = v
        })
        .join(&mean_by_player(games, Black, |g| Black.elo(g)), |r, v| {
            r.black_avg_elo = v
        })
        .join(
            &sum_by_player(games, White, |g| White.opponent_elo(g)),
            |r, v| r.white_opponent_elo_sum = v,
        )
        .join(
            &sum_by_player(games, Black, |g| Black.opponent_elo(g)),
            |r, v| r.black_opponent_elo_sum = v,
        );

    // Missing observations add nothing to a sum.
    for metric in Metric::ALL {
        joiner = joiner
            .join(
                &sum_by_player(games, White, |g| White.metric(g, metric).unwrap_or(0.0)),
                move |r, v| r.white.set(metric, v),
            )
            .join(
                &sum_by_player(games, Black, |g| Black.metric(g, metric).unwrap_or(0.0)),
                move |r, v| r.black.set(metric, v),
            );
    }

    joiner
        .join(&metric_dispersion_by_player(games), |r, d| r.dispersion = d)
        .finish()
}

/// Pooled dispersion of all four metrics, one row per player with any observation.
pub fn metric_dispersion_by_player(games: &[GameRecord]) -> PlayerTable<MetricDispersion> {
    let [gi, gi_raw, gpl, acpl] = Metric::ALL.map(|metric| {
        let pooled = pooled_observations(games, metric);
        debug!(metric = metric.name(), players = pooled.len(), "pooled observations");
        dispersion_by_player(&pooled)
    });
    let parts: [(&PlayerTable<Dispersion>, fn(&mut MetricDispersion, Dispersion)); 4] = [
        (&gi, |r, d| r.gi = d),
        (&gi_raw, |r, d| r.gi_raw = d),
        (&gpl, |r, d| r.gpl = d),
        (&acpl, |r, d| r.acpl = d),
    ];
    full_outer_join_on_player(&parts)
}

/// Aggregates, joins, derives, rates, projects and sorts.
pub fn compute_player_stats(table: &GameTable, cfg: &StatsConfig) -> StatsResult<StatsTable> {
    let sums = aggregate_player_sums(table.games());
    debug!(players = sums.len(), "joined per-player aggregates");

    let mut rows = Vec::with_capacity(sums.len());
    let mut unsolved_tpr = Vec::new();
    for (player, s) in sums.iter() {
        let tpr = match rating::performance_rating(
            s.points(),
            s.total_games(),
            s.average_opponent_rating(),
            cfg.threshold,
        ) {
            Ok(tpr) => tpr,
            Err(source) if cfg.strict_solver => {
                return Err(StatsError::SolverNonconvergence {
                    player: player.to_string(),
                    source,
                });
            }
            Err(err) => {
                warn!(player, error = %err, "TPR left empty");
                unsolved_tpr.push(player.to_string());
                None
            }
        };
        rows.push(project(player, s, tpr, cfg.single_sample_spread));
    }

    sort_by_avg_gi_desc(&mut rows);
    Ok(StatsTable { rows, unsolved_tpr })
}

fn project(player: &str, s: &PlayerSums, tpr: Option<i64>, spread: SingleSampleSpread) -> PlayerStats {
    let fill = |v: Option<f64>| match spread {
        SingleSampleSpread::Undefined => v,
        SingleSampleSpread::Zero => Some(v.unwrap_or(0.0)),
    };
    let d = &s.dispersion;
    PlayerStats {
        player: player.to_string(),
        avg_gi: s.metric_average(Metric::Gi),
        avg_gpl: s.metric_average(Metric::Gpl),
        avg_acpl: s.metric_average(Metric::Acpl),
        total_game_count: s.total_games(),
        points: s.points(),
        elo: s.estimated_rating(),
        tpr,
        total_moves: s.total_moves(),
        white_games: s.white_games,
        black_games: s.black_games,
        gi_median: fill(d.gi.median),
        gpl_median: fill(d.gpl.median),
        acpl_median: fill(d.acpl.median),
        gi_std: fill(d.gi.std_dev),
        gpl_std: fill(d.gpl.std_dev),
        acpl_std: fill(d.acpl.std_dev),
        avg_gi_raw: s.metric_average(Metric::GiRaw),
        white_gpl_sum: s.white.gpl,
        black_gpl_sum: s.black.gpl,
        white_acpl_sum: s.white.acpl,
        black_acpl_sum: s.black.acpl,
        white_result_sum: s.white_result_sum,
        black_result_sum: s.black_result_sum,
        total_gpl_sum: s.metric_total(Metric::Gpl),
        gi_var: fill(d.gi.variance),
        gi_raw_median: fill(d.gi_raw.median),
        gi_raw_var: fill(d.gi_raw.variance),
        gi_raw_std: fill(d.gi_raw.std_dev),
        gpl_var: fill(d.gpl.variance),
        acpl_var: fill(d.acpl.variance),
    }
}

/// Full run: load `input`, compute, write `<output_dir>/<output_file_name>`.
///
/// A missing input is reported and yields [`RunOutcome::MissingInput`]
/// instead of an error.
pub fn run(input: &Path, output_dir: &Path, cfg: &StatsConfig) -> Result<RunOutcome> {
    cfg.validate()?;
    if !input.exists() {
        warn!(path = %input.display(), "input file not found, nothing written");
        return Ok(RunOutcome::MissingInput(input.to_path_buf()));
    }

    let table = GameTable::load(input)
        .with_context(|| format!("load games from {}", input.display()))?;
    info!(games = table.len(), path = %input.display(), "loaded games");

    let stats = compute_player_stats(&table, cfg)?;
    info!(
        players = stats.rows.len(),
        unsolved_tpr = stats.unsolved_tpr.len(),
        "computed player stats"
    );

    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;
    let output = output_dir.join(&cfg.output_file_name);
    player_stats::write_csv(&stats.rows, &output)?;
    info!(path = %output.display(), "wrote player stats");

    let xlsx_output = if cfg.xlsx {
        let path = output.with_extension("xlsx");
        player_stats::write_xlsx(&stats.rows, &path)?;
        info!(path = %path.display(), "wrote workbook");
        Some(path)
    } else {
        None
    };

    Ok(RunOutcome::Completed(RunSummary {
        input: input.to_path_buf(),
        output,
        xlsx_output,
        games: table.len(),
        players: stats.rows.len(),
        unsolved_tpr: stats.unsolved_tpr,
        config: cfg.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}
