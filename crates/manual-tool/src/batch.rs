//! Directory conversion.
//!
//! Every record under a directory tree is rewritten into a sibling tree named
//! `<dir>.<ext>`; subdirectories are mirrored and other files copied as they are.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chess_manual::{ChessManual, RecFormat};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTotals {
    pub files: usize,
    pub dirs: usize,
    pub copied: usize,
    pub failed: usize,
    pub moves: usize,
    pub remarks: usize,
    pub remark_len_max: usize,
}

/// Sibling output directory for `dir` converted to `fmt`. A format suffix on `dir`
/// itself is replaced, so `games.xqf` becomes `games.bin`.
pub fn output_dir(dir: &Path, fmt: RecFormat) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .with_context(|| format!("{} has no directory name", dir.display()))?;
    let has_format_suffix = dir
        .extension()
        .and_then(|e| e.to_str())
        .and_then(RecFormat::parse)
        .is_some();
    let stem = match dir.file_stem() {
        Some(stem) if has_format_suffix => stem,
        _ => name,
    };
    Ok(dir.with_file_name(format!("{}.{}", stem.to_string_lossy(), fmt)))
}

pub fn convert_dir(dir: &Path, fmt: RecFormat, continue_on_error: bool) -> Result<BatchTotals> {
    if fmt == RecFormat::Xqf {
        bail!("XQF is read-only and cannot be a batch target");
    }
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let out_root = output_dir(dir, fmt)?;
    fs::create_dir_all(&out_root)
        .with_context(|| format!("Failed to create {}", out_root.display()))?;
    info!(from = %dir.display(), to = %out_root.display(), format = %fmt, "Converting directory");

    let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut totals = BatchTotals::default();
    for entry in glob::glob(&pattern)?.filter_map(|p| p.ok()) {
        let relative = entry.strip_prefix(dir)?;
        let target = out_root.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            totals.dirs += 1;
            continue;
        }

        let is_record = entry
            .extension()
            .and_then(|e| e.to_str())
            .and_then(RecFormat::parse)
            .is_some();
        if !is_record {
            fs::copy(&entry, &target)
                .with_context(|| format!("Failed to copy {}", entry.display()))?;
            totals.copied += 1;
            continue;
        }

        let target = target.with_extension(&fmt.ext()[1..]);
        match convert_file(&entry, &target) {
            Ok(manual) => {
                let stats = manual.stats();
                totals.files += 1;
                totals.moves += stats.move_count;
                totals.remarks += stats.remark_count;
                totals.remark_len_max = totals.remark_len_max.max(stats.remark_len_max);
                debug!(file = %entry.display(), moves = stats.move_count, "Converted");
            }
            Err(e) if continue_on_error => {
                warn!(file = %entry.display(), error = %e, "Skipping record");
                totals.failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        files = totals.files,
        dirs = totals.dirs,
        copied = totals.copied,
        failed = totals.failed,
        moves = totals.moves,
        remarks = totals.remarks,
        remark_len_max = totals.remark_len_max,
        "Batch complete"
    );
    Ok(totals)
}

fn convert_file(source: &Path, target: &Path) -> Result<ChessManual> {
    let manual =
        ChessManual::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
    manual
        .write(target)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(manual)
}
