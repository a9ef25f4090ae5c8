//! Grouped per-player aggregates over a single column of the game table.
//!
//! Every table produced here is keyed by player identity and only contains the
//! players that actually appear in the requested role. Filling gaps with zero is
//! the joiner's job, not the aggregator's.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::AddAssign;

use statrs::statistics::Statistics;

use crate::game_table::{GameRecord, Metric, Side};

/// Per-player values, ordered by player identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable<V> {
    rows: BTreeMap<String, V>,
}

impl<V> Default for PlayerTable<V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<V> PlayerTable<V> {
    pub fn get(&self, player: &str) -> Option<&V> {
        self.rows.get(player)
    }

    pub fn contains(&self, player: &str) -> bool {
        self.rows.contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entry(&mut self, player: &str) -> btree_map::Entry<'_, String, V> {
        self.rows.entry(player.to_string())
    }

    pub fn map<U>(self, mut f: impl FnMut(&str, V) -> U) -> PlayerTable<U> {
        PlayerTable {
            rows: self
                .rows
                .into_iter()
                .map(|(player, value)| {
                    let mapped = f(&player, value);
                    (player, mapped)
                })
                .collect(),
        }
    }
}

impl<V> FromIterator<(String, V)> for PlayerTable<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for PlayerTable<V> {
    type Item = (String, V);
    type IntoIter = btree_map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Median and spread of one player's pooled per-game observations.
///
/// `variance` and `std_dev` use the sample (n - 1) denominator and are `None`
/// when the player has a single observation. Everything is `None` for a
/// player without any observation of the metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dispersion {
    pub median: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Dispersion {
    pub fn from_sample(sample: &[f64]) -> Option<Self> {
        if sample.is_empty() {
            return None;
        }
        let variance = Some(sample.iter().variance()).filter(|v| v.is_finite());
        let std_dev = Some(sample.iter().std_dev()).filter(|v| v.is_finite());
        Some(Self {
            median: Some(median(sample)),
            variance,
            std_dev,
        })
    }
}

pub fn sum_by_player<V>(
    games: &[GameRecord],
    side: Side,
    value: impl Fn(&GameRecord) -> V,
) -> PlayerTable<V>
where
    V: Copy + Default + AddAssign,
{
    let mut out = PlayerTable::default();
    for game in games {
        *out.entry(side.player(game)).or_default() += value(game);
    }
    out
}

pub fn count_by_player(games: &[GameRecord], side: Side) -> PlayerTable<u32> {
    let mut out = PlayerTable::default();
    for game in games {
        *out.entry(side.player(game)).or_insert(0) += 1;
    }
    out
}

pub fn mean_by_player(
    games: &[GameRecord],
    side: Side,
    value: impl Fn(&GameRecord) -> f64,
) -> PlayerTable<f64> {
    let mut acc: PlayerTable<(f64, u32)> = PlayerTable::default();
    for game in games {
        let slot = acc.entry(side.player(game)).or_insert((0.0, 0));
        slot.0 += value(game);
        slot.1 += 1;
    }
    acc.map(|_, (sum, n)| sum / n as f64)
}

/// Every per-game observation of `metric`, White games and Black games pooled
/// into one sample per player. Missing observations are skipped.
pub fn pooled_observations(games: &[GameRecord], metric: Metric) -> PlayerTable<Vec<f64>> {
    let mut out: PlayerTable<Vec<f64>> = PlayerTable::default();
    for side in Side::BOTH {
        for game in games {
            if let Some(value) = side.metric(game, metric) {
                out.entry(side.player(game)).or_default().push(value);
            }
        }
    }
    out
}

pub fn dispersion_by_player(pooled: &PlayerTable<Vec<f64>>) -> PlayerTable<Dispersion> {
    pooled
        .iter()
        .filter_map(|(player, sample)| {
            Dispersion::from_sample(sample).map(|d| (player.to_string(), d))
        })
        .collect()
}

fn median(sample: &[f64]) -> f64 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
