use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::error::{StatsError, StatsResult};

pub const REQUIRED_COLUMNS: [&str; 16] = [
    "White",
    "Black",
    "WhiteElo",
    "BlackElo",
    "WhiteResult",
    "BlackResult",
    "white_move_number",
    "black_move_number",
    "white_gi",
    "black_gi",
    "white_gi_raw",
    "black_gi_raw",
    "white_gpl",
    "black_gpl",
    "white_acpl",
    "black_acpl",
];

/// One played game, as read from the games CSV.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "White")]
    pub white_player: String,
    #[serde(rename = "Black")]
    pub black_player: String,
    #[serde(rename = "WhiteElo", deserialize_with = "finite_f64")]
    pub white_elo: f64,
    #[serde(rename = "BlackElo", deserialize_with = "finite_f64")]
    pub black_elo: f64,
    #[serde(rename = "WhiteResult", deserialize_with = "finite_f64")]
    pub white_result: f64,
    #[serde(rename = "BlackResult", deserialize_with = "finite_f64")]
    pub black_result: f64,
    #[serde(rename = "white_move_number", deserialize_with = "move_count")]
    pub white_move_count: u32,
    #[serde(rename = "black_move_number", deserialize_with = "move_count")]
    pub black_move_count: u32,
    // Quality metrics are `None` for games the engine could not analyse
    // (blank, NaN or infinite cell).
    #[serde(deserialize_with = "metric_value")]
    pub white_gi: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub black_gi: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub white_gi_raw: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub black_gi_raw: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub white_gpl: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub black_gpl: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub white_acpl: Option<f64>,
    #[serde(deserialize_with = "metric_value")]
    pub black_acpl: Option<f64>,
}

/// The colour a player had in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

/// Per-side quality metrics. Any of them may be missing for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Gi,
    GiRaw,
    Gpl,
    Acpl,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];

    pub fn player(self, game: &GameRecord) -> &str {
        match self {
            Side::White => &game.white_player,
            Side::Black => &game.black_player,
        }
    }

    pub fn elo(self, game: &GameRecord) -> f64 {
        match self {
            Side::White => game.white_elo,
            Side::Black => game.black_elo,
        }
    }

    pub fn opponent_elo(self, game: &GameRecord) -> f64 {
        self.opposite().elo(game)
    }

    pub fn result(self, game: &GameRecord) -> f64 {
        match self {
            Side::White => game.white_result,
            Side::Black => game.black_result,
        }
    }

    pub fn moves(self, game: &GameRecord) -> u32 {
        match self {
            Side::White => game.white_move_count,
            Side::Black => game.black_move_count,
        }
    }

    pub fn metric(self, game: &GameRecord, metric: Metric) -> Option<f64> {
        match (self, metric) {
            (Side::White, Metric::Gi) => game.white_gi,
            (Side::White, Metric::GiRaw) => game.white_gi_raw,
            (Side::White, Metric::Gpl) => game.white_gpl,
            (Side::White, Metric::Acpl) => game.white_acpl,
            (Side::Black, Metric::Gi) => game.black_gi,
            (Side::Black, Metric::GiRaw) => game.black_gi_raw,
            (Side::Black, Metric::Gpl) => game.black_gpl,
            (Side::Black, Metric::Acpl) => game.black_acpl,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Gi, Metric::GiRaw, Metric::Gpl, Metric::Acpl];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Gi => "gi",
            Metric::GiRaw => "gi_raw",
            Metric::Gpl => "gpl",
            Metric::Acpl => "acpl",
        }
    }
}

/// All games of one run. Read once, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct GameTable {
    games: Vec<GameRecord>,
}

impl GameTable {
    pub fn from_records(games: Vec<GameRecord>) -> Self {
        Self { games }
    }

    pub fn load(path: &Path) -> StatsResult<Self> {
        if !path.exists() {
            return Err(StatsError::MissingInputFile(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| StatsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path)
    }

    /// Parses games from any CSV source. `source` is only used in error messages.
    pub fn from_reader<R: Read>(rdr: R, source: &Path) -> StatsResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let headers = reader
            .headers()
            .map_err(|err| csv_error(source, err))?
            .clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(schema_violation(
                source,
                format!("missing required columns: {}", missing.join(", ")),
            ));
        }

        let mut games = Vec::new();
        for (idx, row) in reader.deserialize::<GameRecord>().enumerate() {
            // Header is line 1, so the first data row is line 2.
            let line = idx + 2;
            let game = row.map_err(|err| {
                if matches!(err.kind(), csv::ErrorKind::Deserialize { .. }) {
                    schema_violation(source, format!("line {line}: {err}"))
                } else {
                    csv_error(source, err)
                }
            })?;
            if game.white_player.is_empty() || game.black_player.is_empty() {
                return Err(schema_violation(
                    source,
                    format!("line {line}: empty player identity"),
                ));
            }
            games.push(game);
        }

        Ok(Self { games })
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Every identity seen as White or Black, in lexicographic order.
    pub fn players(&self) -> BTreeSet<&str> {
        self.games
            .iter()
            .flat_map(|g| [g.white_player.as_str(), g.black_player.as_str()])
            .collect()
    }
}

fn schema_violation(path: &Path, message: String) -> StatsError {
    StatsError::SchemaViolation {
        path: PathBuf::from(path),
        message,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StatsError {
    StatsError::Csv {
        path: PathBuf::from(path),
        source,
    }
}

fn finite_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "expected a finite number, got {raw}"
        )));
    }
    Ok(raw)
}

fn metric_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.filter(|v| v.is_finite()))
}

// Files re-exported by dataframe tools often store integer columns as "34.0".
fn move_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 || raw > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "move count must be a non-negative integer, got {raw}"
        )));
    }
    Ok(raw as u32)
}
