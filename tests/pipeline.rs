use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chess_season_stats::config::{SingleSampleSpread, StatsConfig};
use chess_season_stats::error::StatsError;
use chess_season_stats::game_table::GameTable;
use chess_season_stats::pipeline::{self, RunOutcome, compute_player_stats};
use chess_season_stats::player_stats::{OUTPUT_COLUMNS, PlayerStats};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn load_fixture(name: &str) -> GameTable {
    GameTable::load(&fixture_path(name)).expect("fixture should load")
}

fn row<'a>(rows: &'a [PlayerStats], player: &str) -> &'a PlayerStats {
    rows.iter()
        .find(|r| r.player == player)
        .unwrap_or_else(|| panic!("missing row for {player}"))
}

#[test]
fn two_game_scenario() {
    let table = load_fixture("two_games.csv");
    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");
    assert_eq!(stats.rows.len(), 2);
    assert!(stats.unsolved_tpr.is_empty());

    let a = &stats.rows[0];
    assert_eq!(a.player, "A");
    assert_eq!(a.total_game_count, 2);
    assert_eq!(a.points, 1.5);
    assert_eq!(a.avg_gi, Some(77.5));
    assert_eq!(a.avg_acpl, Some(19.5));
    assert_eq!(a.total_moves, 74);
    assert_eq!((a.white_games, a.black_games), (1, 1));
    assert_eq!(a.white_gpl_sum, 2.0);
    assert_eq!(a.black_gpl_sum, 2.5);
    assert_eq!(a.total_gpl_sum, 4.5);
    assert_eq!(a.gi_median, Some(77.5));
    assert_eq!(a.gi_var, Some(12.5));
    assert_eq!(a.elo, 1510);
    // 1400 + 373.64: the smallest edge with P(score >= 1.5 of 2) >= 0.75.
    assert_eq!(a.tpr, Some(1774));

    let b = &stats.rows[1];
    assert_eq!(b.player, "B");
    assert_eq!(b.total_game_count, 2);
    assert_eq!(b.points, 0.5);
    assert_eq!(b.avg_gi, Some(65.0));
    assert_eq!(b.total_moves, 75);
    assert_eq!(b.elo, 1400);
    // 1510 - 8.06.
    assert_eq!(b.tpr, Some(1502));
}

#[test]
fn every_player_appears_exactly_once() {
    let table = load_fixture("season.csv");
    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");

    let seen: BTreeSet<&str> = stats.rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(seen, table.players());
    assert_eq!(seen.len(), stats.rows.len());
    assert!(stats.rows.iter().all(|r| r.total_game_count > 0));
}

#[test]
fn totals_match_the_input_games() {
    let table = load_fixture("season.csv");
    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");

    for r in &stats.rows {
        let as_white: Vec<_> = table
            .games()
            .iter()
            .filter(|g| g.white_player == r.player)
            .collect();
        let as_black: Vec<_> = table
            .games()
            .iter()
            .filter(|g| g.black_player == r.player)
            .collect();

        assert_eq!(r.white_games as usize, as_white.len());
        assert_eq!(r.black_games as usize, as_black.len());
        assert_eq!(r.total_game_count, r.white_games + r.black_games);

        let gpl_white: f64 = as_white.iter().filter_map(|g| g.white_gpl).sum();
        let gpl_black: f64 = as_black.iter().filter_map(|g| g.black_gpl).sum();
        assert!((r.white_gpl_sum - gpl_white).abs() < 1e-9);
        assert!((r.black_gpl_sum - gpl_black).abs() < 1e-9);
        assert!((r.total_gpl_sum - (gpl_white + gpl_black)).abs() < 1e-9);

        let points: f64 = as_white.iter().map(|g| g.white_result).sum::<f64>()
            + as_black.iter().map(|g| g.black_result).sum::<f64>();
        assert!((r.points - points).abs() < 1e-9);

        let gi: f64 = as_white.iter().filter_map(|g| g.white_gi).sum::<f64>()
            + as_black.iter().filter_map(|g| g.black_gi).sum::<f64>();
        let avg = r.avg_gi.expect("players in the output have games");
        assert!((avg - gi / r.total_game_count as f64).abs() < 1e-9);
    }
}

#[test]
fn elo_uses_only_the_colours_played() {
    let table = load_fixture("season.csv");
    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");

    let so = row(&stats.rows, "So");
    assert_eq!((so.white_games, so.black_games), (1, 0));
    assert_eq!(so.elo, 2750);

    // White 2830, Black mean (2832 + 2835) / 2.
    let carlsen = row(&stats.rows, "Carlsen");
    assert_eq!(carlsen.elo, 2832);
}

#[test]
fn rows_are_sorted_by_avg_gi_descending() {
    let table = load_fixture("season.csv");
    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");
    let gis: Vec<f64> = stats
        .rows
        .iter()
        .map(|r| r.avg_gi.expect("avg_gi"))
        .collect();
    assert!(gis.windows(2).all(|w| w[0] >= w[1]), "{gis:?}");
    assert_eq!(stats.rows[0].player, "Carlsen");
}

#[test]
fn single_game_players_follow_spread_mode() {
    let table = load_fixture("season.csv");

    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");
    let so = row(&stats.rows, "So");
    assert_eq!(so.gi_median, Some(79.0));
    assert_eq!(so.gi_var, None);
    assert_eq!(so.gi_std, None);

    let cfg = StatsConfig {
        single_sample_spread: SingleSampleSpread::Zero,
        ..StatsConfig::default()
    };
    let stats = compute_player_stats(&table, &cfg).expect("stats");
    let so = row(&stats.rows, "So");
    assert_eq!(so.gi_var, Some(0.0));
    assert_eq!(so.acpl_std, Some(0.0));
}

#[test]
fn reruns_are_byte_identical() {
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    let input = fixture_path("season.csv");
    let cfg = StatsConfig::default();

    for dir in [first.path(), second.path()] {
        let outcome = pipeline::run(&input, dir, &cfg).expect("run");
        assert!(matches!(outcome, RunOutcome::Completed(_)));
    }

    let a = fs::read(first.path().join("player_stats.csv")).expect("first output");
    let b = fs::read(second.path().join("player_stats.csv")).expect("second output");
    assert_eq!(a, b);
}

#[test]
fn run_writes_header_in_output_order() {
    let out = tempfile::tempdir().expect("tempdir");
    let nested = out.path().join("reports").join("season");
    let outcome = pipeline::run(&fixture_path("two_games.csv"), &nested, &StatsConfig::default())
        .expect("run");

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.games, 2);
    assert_eq!(summary.players, 2);
    assert_eq!(summary.output, nested.join("player_stats.csv"));
    assert!(summary.xlsx_output.is_none());

    let text = fs::read_to_string(&summary.output).expect("output");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(OUTPUT_COLUMNS.join(",").as_str()));
    assert!(lines.next().expect("first row").starts_with("A,77.5,"));
    assert_eq!(lines.count(), 1);
}

#[test]
fn xlsx_export_sits_next_to_csv() {
    let out = tempfile::tempdir().expect("tempdir");
    let cfg = StatsConfig {
        xlsx: true,
        ..StatsConfig::default()
    };
    let outcome = pipeline::run(&fixture_path("two_games.csv"), out.path(), &cfg).expect("run");
    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a completed run");
    };
    let xlsx = summary.xlsx_output.expect("xlsx path");
    assert_eq!(xlsx, out.path().join("player_stats.xlsx"));
    assert!(fs::metadata(&xlsx).expect("xlsx written").len() > 0);
}

#[test]
fn missing_input_writes_nothing() {
    let out = tempfile::tempdir().expect("tempdir");
    let input = fixture_path("does_not_exist.csv");
    let outcome = pipeline::run(&input, out.path(), &StatsConfig::default()).expect("run");
    assert!(matches!(outcome, RunOutcome::MissingInput(ref p) if *p == input));
    assert_eq!(fs::read_dir(out.path()).expect("read dir").count(), 0);
}

#[test]
fn schema_violations_are_fatal() {
    for name in ["missing_column.csv", "bad_cell.csv", "blank_player.csv"] {
        let err = GameTable::load(&fixture_path(name)).expect_err(name);
        assert!(
            matches!(err, StatsError::SchemaViolation { .. }),
            "{name}: {err}"
        );
    }

    let err = GameTable::load(&fixture_path("missing_column.csv")).expect_err("missing column");
    assert!(err.to_string().contains("black_acpl"));
    let err = GameTable::load(&fixture_path("bad_cell.csv")).expect_err("bad cell");
    assert!(err.to_string().contains("line 3"));

    let out = tempfile::tempdir().expect("tempdir");
    let result = pipeline::run(&fixture_path("bad_cell.csv"), out.path(), &StatsConfig::default());
    assert!(result.is_err());
    assert!(!out.path().join("player_stats.csv").exists());
}

#[test]
fn unanalysed_games_keep_every_player() {
    let table = load_fixture("unanalysed.csv");
    let stats = compute_player_stats(&table, &StatsConfig::default()).expect("stats");
    let players: Vec<&str> = stats.rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(players, vec!["C", "A", "B", "D"]);
    assert!(stats.rows.iter().all(|r| r.avg_gi.is_some_and(f64::is_finite)));

    // B's only gi cell is blank: nothing summed, no median.
    let b = row(&stats.rows, "B");
    assert_eq!(b.total_game_count, 1);
    assert_eq!(b.avg_gi, Some(0.0));
    assert_eq!(b.gi_median, None);
    assert_eq!(b.avg_acpl, Some(30.0));

    // D's NaN and inf cells are missing too, not propagated.
    let d = row(&stats.rows, "D");
    assert_eq!(d.avg_gi, Some(0.0));
    assert_eq!(d.gi_median, None);
    assert_eq!(d.black_gpl_sum, 0.0);
    assert_eq!(d.acpl_median, Some(40.0));
}
