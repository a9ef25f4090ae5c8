//! The joined per-player wide row and the metrics derived from it.

use crate::aggregate::Dispersion;
use crate::game_table::Metric;

/// Sum of each quality metric for one colour.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricSums {
    pub gi: f64,
    pub gi_raw: f64,
    pub gpl: f64,
    pub acpl: f64,
}

impl MetricSums {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Gi => self.gi,
            Metric::GiRaw => self.gi_raw,
            Metric::Gpl => self.gpl,
            Metric::Acpl => self.acpl,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Gi => self.gi = value,
            Metric::GiRaw => self.gi_raw = value,
            Metric::Gpl => self.gpl = value,
            Metric::Acpl => self.acpl = value,
        }
    }
}

/// Pooled dispersion of each quality metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricDispersion {
    pub gi: Dispersion,
    pub gi_raw: Dispersion,
    pub gpl: Dispersion,
    pub acpl: Dispersion,
}

/// Every partial aggregate of one player after the outer join.
/// Fields a player had no rows for are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerSums {
    pub white_games: u32,
    pub black_games: u32,
    pub white_moves: u64,
    pub black_moves: u64,
    pub white_result_sum: f64,
    pub black_result_sum: f64,
    pub white: MetricSums,
    pub black: MetricSums,
    pub white_avg_elo: f64,
    pub black_avg_elo: f64,
    pub white_opponent_elo_sum: f64,
    pub black_opponent_elo_sum: f64,
    pub dispersion: MetricDispersion,
}

impl PlayerSums {
    pub fn total_games(&self) -> u32 {
        total_games(self.white_games, self.black_games)
    }

    pub fn total_moves(&self) -> u64 {
        total_moves(self.white_moves, self.black_moves)
    }

    pub fn points(&self) -> f64 {
        self.white_result_sum + self.black_result_sum
    }

    pub fn metric_total(&self, metric: Metric) -> f64 {
        self.white.get(metric) + self.black.get(metric)
    }

    pub fn metric_average(&self, metric: Metric) -> Option<f64> {
        average_per_game(self.metric_total(metric), self.total_games())
    }

    pub fn average_opponent_rating(&self) -> Option<f64> {
        average_opponent_rating(
            self.white_opponent_elo_sum,
            self.black_opponent_elo_sum,
            self.total_games(),
        )
    }

    pub fn estimated_rating(&self) -> i64 {
        estimated_rating(self.white_avg_elo, self.black_avg_elo)
    }
}

pub fn total_games(white_count: u32, black_count: u32) -> u32 {
    white_count + black_count
}

pub fn total_moves(white_move_sum: u64, black_move_sum: u64) -> u64 {
    white_move_sum + black_move_sum
}

/// `None` when the player has no games, for every averaged metric alike.
pub fn average_per_game(metric_sum: f64, total_games: u32) -> Option<f64> {
    if total_games == 0 {
        return None;
    }
    Some(metric_sum / total_games as f64)
}

/// Opponents' Elo summed over White games (Black's rating) and Black games
/// (White's rating), divided by all games played.
pub fn average_opponent_rating(
    white_games_opponent_sum: f64,
    black_games_opponent_sum: f64,
    total_games: u32,
) -> Option<f64> {
    average_per_game(white_games_opponent_sum + black_games_opponent_sum, total_games)
}

/// Single Elo figure for a player from their per-colour average ratings.
///
/// - both averages positive: their mean
/// - otherwise: the larger one, i.e. the colour the player actually played
///   (zero when neither is populated)
///
/// The result is rounded half-to-even to a whole rating point.
pub fn estimated_rating(avg_elo_white: f64, avg_elo_black: f64) -> i64 {
    let estimate = if avg_elo_white > 0.0 && avg_elo_black > 0.0 {
        (avg_elo_white + avg_elo_black) / 2.0
    } else {
        avg_elo_white.max(avg_elo_black)
    };
    round_rating(estimate)
}

pub fn round_rating(rating: f64) -> i64 {
    rating.round_ties_even() as i64
}
