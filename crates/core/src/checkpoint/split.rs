//! Splitting a simulator's combined architectural-state log into
//! per-checkpoint `loadarch` files, and writing the rest of the checkpoint
//! directory layout.

use std::fs;
use std::path::Path;

use crate::cache::mtr::Mtr;
use crate::common::error::TidalSimError;

/// Splits `combined_log` (the full stdout capture from running an
/// [`crate::checkpoint::cmd::inst_points_dump`] plan) into `n_checkpoints`
/// equal chunks and writes chunk `i` as `loadarch` in `checkpoint_dirs[i]`.
///
/// # Errors
///
/// Returns [`TidalSimError::InvariantViolation`] if `combined_log`'s line
/// count does not match `expected_lines`, or if `expected_lines` is not
/// evenly divisible by `checkpoint_dirs.len()`. Returns
/// [`TidalSimError::Io`] if writing a chunk fails.
pub fn split_loadarch(
    combined_log: &str,
    expected_lines: usize,
    checkpoint_dirs: &[impl AsRef<Path>],
) -> Result<(), TidalSimError> {
    let lines: Vec<&str> = combined_log.lines().collect();
    if lines.len() != expected_lines {
        return Err(TidalSimError::InvariantViolation {
            context: "loadarch line count did not match the predicted command plan".to_string(),
            expected: expected_lines,
            actual: lines.len(),
        });
    }
    if checkpoint_dirs.is_empty() || expected_lines % checkpoint_dirs.len() != 0 {
        return Err(TidalSimError::InvariantViolation {
            context: "expected_lines is not evenly divisible by the checkpoint count".to_string(),
            expected: checkpoint_dirs.len(),
            actual: expected_lines,
        });
    }
    let lines_per_chunk = expected_lines / checkpoint_dirs.len();

    for (i, dir) in checkpoint_dirs.iter().enumerate() {
        let chunk = &lines[i * lines_per_chunk..(i + 1) * lines_per_chunk];
        let mut content = chunk.join("\n");
        content.push('\n');
        fs::write(dir.as_ref().join("loadarch"), content)?;
    }
    Ok(())
}

/// Writes `mtr.json` (a serialized [`Mtr`] snapshot) and `mtr.pretty` (a
/// human-readable listing sorted by block address) into `dir`.
///
/// # Errors
///
/// Returns [`TidalSimError::Io`] if writing either file fails, or
/// [`TidalSimError::Serde`] if serializing `mtr` to JSON fails.
pub fn write_checkpoint_artifacts(dir: &Path, mtr: &Mtr) -> Result<(), TidalSimError> {
    let json = serde_json::to_string_pretty(mtr)?;
    fs::write(dir.join("mtr.json"), json)?;

    let mut entries: Vec<(&u64, &crate::cache::mtr::MtrEntry)> = mtr.table.iter().collect();
    entries.sort_by_key(|(addr, _)| **addr);
    let mut pretty = String::new();
    for (addr, entry) in entries {
        pretty.push_str(&format!(
            "block {addr:#x}: last_read={:?} last_write={:?}\n",
            entry.last_read_ts, entry.last_write_ts
        ));
    }
    fs::write(dir.join("mtr.pretty"), pretty)?;
    Ok(())
}
