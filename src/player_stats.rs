//! The final one-row-per-player table and its CSV / workbook writers.

use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::persist::write_via_tmp;

pub const OUTPUT_COLUMNS: [&str; 31] = [
    "Player",
    "avg_gi",
    "avg_gpl",
    "avg_acpl",
    "total_game_count",
    "Points",
    "Elo",
    "TPR",
    "total_moves",
    "White_games",
    "Black_games",
    "gi_median",
    "gpl_median",
    "acpl_median",
    "gi_std",
    "gpl_std",
    "acpl_std",
    "avg_gi_raw",
    "white_gpl_sum",
    "black_gpl_sum",
    "white_acpl_sum",
    "black_acpl_sum",
    "white_result_sum",
    "black_result_sum",
    "total_gpl_sum",
    "gi_var",
    "gi_raw_median",
    "gi_raw_var",
    "gi_raw_std",
    "gpl_var",
    "acpl_var",
];

/// One output row. Field order is the CSV column order; `None` is written as
/// an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    #[serde(rename = "Player")]
    pub player: String,
    pub avg_gi: Option<f64>,
    pub avg_gpl: Option<f64>,
    pub avg_acpl: Option<f64>,
    pub total_game_count: u32,
    #[serde(rename = "Points")]
    pub points: f64,
    #[serde(rename = "Elo")]
    pub elo: i64,
    #[serde(rename = "TPR")]
    pub tpr: Option<i64>,
    pub total_moves: u64,
    #[serde(rename = "White_games")]
    pub white_games: u32,
    #[serde(rename = "Black_games")]
    pub black_games: u32,
    pub gi_median: Option<f64>,
    pub gpl_median: Option<f64>,
    pub acpl_median: Option<f64>,
    pub gi_std: Option<f64>,
    pub gpl_std: Option<f64>,
    pub acpl_std: Option<f64>,
    pub avg_gi_raw: Option<f64>,
    pub white_gpl_sum: f64,
    pub black_gpl_sum: f64,
    pub white_acpl_sum: f64,
    pub black_acpl_sum: f64,
    pub white_result_sum: f64,
    pub black_result_sum: f64,
    pub total_gpl_sum: f64,
    pub gi_var: Option<f64>,
    pub gi_raw_median: Option<f64>,
    pub gi_raw_var: Option<f64>,
    pub gi_raw_std: Option<f64>,
    pub gpl_var: Option<f64>,
    pub acpl_var: Option<f64>,
}

/// Stable sort by `avg_gi`, highest first. Rows without an average (or a NaN
/// one) go last.
pub fn sort_by_avg_gi_desc(rows: &mut [PlayerStats]) {
    let key = |r: &PlayerStats| r.avg_gi.filter(|v| !v.is_nan());
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn write_csv_to<W: Write>(rows: &[PlayerStats], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if rows.is_empty() {
        writer
            .write_record(OUTPUT_COLUMNS)
            .context("write header")?;
    }
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("serialize row for {}", row.player))?;
    }
    writer.flush().context("flush csv")?;
    Ok(())
}

/// Writes through a temporary sibling file and renames it into place.
pub fn write_csv(rows: &[PlayerStats], path: &Path) -> Result<()> {
    write_via_tmp(path, |file| write_csv_to(rows, file))
}

pub fn write_xlsx(rows: &[PlayerStats], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("PlayerStats")?;
        for (col_idx, title) in OUTPUT_COLUMNS.iter().enumerate() {
            sheet
                .write_string(0, col_idx as u16, *title)
                .with_context(|| format!("write header cell {col_idx}"))?;
        }
        for (idx, row) in rows.iter().enumerate() {
            write_row(sheet, idx as u32 + 1, &cells(row))?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

fn opt(value: Option<f64>) -> Cell {
    value.map(Cell::Number).unwrap_or(Cell::Empty)
}

fn cells(row: &PlayerStats) -> Vec<Cell> {
    vec![
        Cell::Text(row.player.clone()),
        opt(row.avg_gi),
        opt(row.avg_gpl),
        opt(row.avg_acpl),
        Cell::Number(row.total_game_count as f64),
        Cell::Number(row.points),
        Cell::Number(row.elo as f64),
        opt(row.tpr.map(|v| v as f64)),
        Cell::Number(row.total_moves as f64),
        Cell::Number(row.white_games as f64),
        Cell::Number(row.black_games as f64),
        opt(row.gi_median),
        opt(row.gpl_median),
        opt(row.acpl_median),
        opt(row.gi_std),
        opt(row.gpl_std),
        opt(row.acpl_std),
        opt(row.avg_gi_raw),
        Cell::Number(row.white_gpl_sum),
        Cell::Number(row.black_gpl_sum),
        Cell::Number(row.white_acpl_sum),
        Cell::Number(row.black_acpl_sum),
        Cell::Number(row.white_result_sum),
        Cell::Number(row.black_result_sum),
        Cell::Number(row.total_gpl_sum),
        opt(row.gi_var),
        opt(row.gi_raw_median),
        opt(row.gi_raw_var),
        opt(row.gi_raw_std),
        opt(row.gpl_var),
        opt(row.acpl_var),
    ]
}

fn write_row(worksheet: &mut Worksheet, row_idx: u32, cells: &[Cell]) -> Result<()> {
    for (col_idx, cell) in cells.iter().enumerate() {
        let col = col_idx as u16;
        match cell {
            Cell::Text(value) => {
                worksheet.write_string(row_idx, col, value)?;
            }
            Cell::Number(value) => {
                worksheet.write_number(row_idx, col, *value)?;
            }
            Cell::Empty => {}
        }
    }
    Ok(())
}
