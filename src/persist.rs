//! Write-to-sibling-then-rename helper for output files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Writes `path` through `<path>.tmp`. The temporary file is removed when
/// `write` or the final rename fails, so `path` is either complete or untouched.
pub fn write_via_tmp<T>(path: &Path, write: impl FnOnce(File) -> Result<T>) -> Result<T> {
    let tmp = tmp_path(path);
    let result = File::create(&tmp)
        .with_context(|| format!("create {}", tmp.display()))
        .and_then(write)
        .and_then(|value| {
            fs::rename(&tmp, path)
                .with_context(|| format!("move output into {}", path.display()))?;
            Ok(value)
        });
    if result.is_err() && tmp.exists() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
