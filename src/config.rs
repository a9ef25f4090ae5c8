use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{StatsError, StatsResult};
use crate::rating::DEFAULT_THRESHOLD;

pub const DEFAULT_OUTPUT_FILE: &str = "player_stats.csv";

pub const ENV_THRESHOLD: &str = "PLAYER_STATS_TPR_THRESHOLD";
pub const ENV_SINGLE_SAMPLE: &str = "PLAYER_STATS_SINGLE_SAMPLE";
pub const ENV_STRICT_SOLVER: &str = "PLAYER_STATS_STRICT_SOLVER";
pub const ENV_XLSX: &str = "PLAYER_STATS_XLSX";

/// How variance and standard deviation are reported for a player with a
/// single pooled observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleSampleSpread {
    /// Empty cell: there is no spread to measure.
    #[default]
    Undefined,
    /// Reported as 0, matching zero-filled dataframe exports.
    Zero,
}

impl FromStr for SingleSampleSpread {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "undefined" | "empty" | "nan" => Ok(Self::Undefined),
            "zero" | "0" => Ok(Self::Zero),
            other => Err(format!(
                "unknown single-sample mode '{other}' (expected 'undefined' or 'zero')"
            )),
        }
    }
}

impl fmt::Display for SingleSampleSpread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Zero => f.write_str("zero"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsConfig {
    /// Confidence threshold handed to the TPR solver.
    pub threshold: f64,
    pub single_sample_spread: SingleSampleSpread,
    /// Fail the whole run when a player's TPR cannot be solved.
    pub strict_solver: bool,
    pub output_file_name: String,
    /// Also write an `.xlsx` workbook next to the CSV.
    pub xlsx: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            single_sample_spread: SingleSampleSpread::default(),
            strict_solver: false,
            output_file_name: DEFAULT_OUTPUT_FILE.to_string(),
            xlsx: false,
        }
    }
}

impl StatsConfig {
    pub fn from_env() -> StatsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns.
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StatsResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(raw) = get(ENV_THRESHOLD) {
            cfg.threshold = raw.trim().parse::<f64>().map_err(|_| {
                StatsError::Config(format!("{ENV_THRESHOLD}: '{raw}' is not a number"))
            })?;
        }
        if let Some(raw) = get(ENV_SINGLE_SAMPLE) {
            cfg.single_sample_spread = raw
                .parse()
                .map_err(|err| StatsError::Config(format!("{ENV_SINGLE_SAMPLE}: {err}")))?;
        }
        if let Some(raw) = get(ENV_STRICT_SOLVER) {
            cfg.strict_solver = parse_flag(ENV_STRICT_SOLVER, &raw)?;
        }
        if let Some(raw) = get(ENV_XLSX) {
            cfg.xlsx = parse_flag(ENV_XLSX, &raw)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> StatsResult<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold >= 1.0 {
            return Err(StatsError::Config(format!(
                "threshold must be strictly between 0 and 1, got {}",
                self.threshold
            )));
        }
        let name = self.output_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StatsError::Config(format!(
                "output file name must be a bare file name, got '{}'",
                self.output_file_name
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> StatsResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(StatsError::Config(format!(
            "{key}: '{other}' is not a boolean"
        ))),
    }
}
