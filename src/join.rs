//! Outer join of per-player partial tables into one wide, typed table.

use crate::aggregate::PlayerTable;

/// Folds partial tables into a wide row type `R`, one outer join at a time.
///
/// After each join every known player has had `assign` called exactly once for
/// that table: with the table's value when present, with `V::default()` (zero)
/// otherwise. Players that only appear in the new table start from `R::default()`.
#[derive(Debug, Clone)]
pub struct Joiner<R> {
    acc: PlayerTable<R>,
}

impl<R: Default> Default for Joiner<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Default> Joiner<R> {
    pub fn new() -> Self {
        Self {
            acc: PlayerTable::default(),
        }
    }

    pub fn join<V>(mut self, table: &PlayerTable<V>, assign: impl Fn(&mut R, V)) -> Self
    where
        V: Clone + Default,
    {
        for player in table.players() {
            self.acc.entry(player).or_default();
        }
        self.acc = self.acc.map(|player, mut row| {
            let value = table.get(player).cloned().unwrap_or_default();
            assign(&mut row, value);
            row
        });
        self
    }

    pub fn finish(self) -> PlayerTable<R> {
        self.acc
    }
}

/// Joins a homogeneous, ordered list of tables left to right.
pub fn full_outer_join_on_player<R, V>(
    tables: &[(&PlayerTable<V>, fn(&mut R, V))],
) -> PlayerTable<R>
where
    R: Default,
    V: Clone + Default,
{
    tables
        .iter()
        .fold(Joiner::new(), |joiner, (table, assign)| {
            joiner.join(table, assign)
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Row {
        white: f64,
        black: f64,
        games: u32,
    }

    fn table<V>(rows: &[(&str, V)]) -> PlayerTable<V>
    where
        V: Clone,
    {
        rows.iter()
            .map(|(player, v)| (player.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn outer_join_keeps_union_and_zero_fills() {
        let white = table(&[("A", 10.0), ("B", 5.0)]);
        let black = table(&[("B", 7.0), ("C", 3.0)]);
        let games = table(&[("C", 2u32)]);

        let joined = Joiner::<Row>::new()
            .join(&white, |r, v| r.white = v)
            .join(&black, |r, v| r.black = v)
            .join(&games, |r, v| r.games = v)
            .finish();

        let players: Vec<&str> = joined.players().collect();
        assert_eq!(players, vec!["A", "B", "C"]);
        assert_eq!(
            joined.get("A"),
            Some(&Row {
                white: 10.0,
                black: 0.0,
                games: 0
            })
        );
        assert_eq!(
            joined.get("C"),
            Some(&Row {
                white: 0.0,
                black: 3.0,
                games: 2
            })
        );
    }

    #[test]
    fn list_join_matches_builder() {
        let white = table(&[("A", 1.0)]);
        let black = table(&[("B", 2.0)]);
        let parts: [(&PlayerTable<f64>, fn(&mut Row, f64)); 2] = [
            (&white, |r, v| r.white = v),
            (&black, |r, v| r.black = v),
        ];
        let joined = full_outer_join_on_player(&parts);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.get("B").map(|r| r.black), Some(2.0));
        assert_eq!(joined.get("B").map(|r| r.white), Some(0.0));
    }
}
