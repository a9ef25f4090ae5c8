use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::persist::write_via_tmp;

pub const COMBINED_FILE_NAME: &str = "combined.csv";

#[derive(Debug, Clone)]
pub struct CombineSummary {
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    pub rows: usize,
    pub columns: Vec<String>,
}

struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Concatenates every `*.csv` in `input_dir` into `input_dir/combined.csv`.
///
/// Files are taken in file-name order and columns are aligned by header name;
/// a column missing from one file is left empty for that file's rows.
pub fn combine_csv_files(input_dir: &Path) -> Result<CombineSummary> {
    let files = list_csv_files(input_dir)?;
    if files.is_empty() {
        return Err(anyhow!("no csv files found in {}", input_dir.display()));
    }

    let tables = files
        .par_iter()
        .map(|path| read_raw_table(path))
        .collect::<Result<Vec<_>>>()?;

    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for header in &table.headers {
            if !columns.contains(header) {
                columns.push(header.clone());
            }
        }
    }

    let output = input_dir.join(COMBINED_FILE_NAME);
    let rows = write_via_tmp(&output, |file| write_aligned(file, &columns, &tables))?;

    info!(
        files = files.len(),
        rows,
        path = %output.display(),
        "combined csv files"
    );
    Ok(CombineSummary {
        path: output,
        files,
        rows,
        columns,
    })
}

fn write_aligned<W: Write>(out: W, columns: &[String], tables: &[RawTable]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns).context("write combined header")?;

    let mut rows = 0usize;
    for table in tables {
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|col| table.headers.iter().position(|h| h == col))
            .collect();
        for row in &table.rows {
            let record = positions
                .iter()
                .map(|pos| pos.and_then(|idx| row.get(idx)).map(String::as_str).unwrap_or(""));
            writer.write_record(record).context("write combined row")?;
            rows += 1;
        }
    }
    writer.flush().context("flush combined csv")?;
    Ok(rows)
}

fn list_csv_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(input_dir).with_context(|| format!("read dir {}", input_dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.context("read dir entry")?.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let is_own_output = path
            .file_name()
            .is_some_and(|name| name == COMBINED_FILE_NAME);
        if is_csv && !is_own_output {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_raw_table(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read row of {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(path = %path.display(), rows = rows.len(), "read csv file");
    Ok(RawTable { headers, rows })
}
