//! The embarrassingly-parallel "apply f to each checkpoint directory" map.

use std::path::Path;

use rayon::prelude::*;

use crate::common::error::TidalSimError;

/// Runs `f` once per directory in `dirs`, in parallel. Every directory is
/// dispatched regardless of earlier failures; if any call returns an error,
/// the first one (by index) is returned after all calls have completed.
///
/// # Errors
///
/// Returns the first `Err` produced by `f`, if any.
pub fn for_each_checkpoint_dir<F>(dirs: &[impl AsRef<Path> + Sync], f: F) -> Result<(), TidalSimError>
where
    F: Fn(&Path) -> Result<(), TidalSimError> + Sync,
{
    let results: Vec<Result<(), TidalSimError>> = dirs.par_iter().map(|dir| f(dir.as_ref())).collect();
    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}
