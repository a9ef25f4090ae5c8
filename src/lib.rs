//! Per-player season statistics from a table of analysed chess games.
//!
//! The pipeline reads one row per game (both colours' ratings, results, move
//! counts and gi/gpl/acpl quality metrics), aggregates every column per player
//! and colour, outer-joins the partial tables, and derives averages, pooled
//! dispersion, an Elo estimate and a tournament performance rating.

pub mod aggregate;
pub mod combine;
pub mod config;
pub mod derived;
pub mod error;
pub mod game_table;
pub mod join;
pub mod logging;
pub mod persist;
pub mod pipeline;
pub mod player_stats;
pub mod rating;

pub use error::{StatsError, StatsResult};
