//! Subcommand implementations

mod check;
mod evaluate;
mod impact;

pub use check::run_check;
pub use evaluate::run_evaluate;
pub use impact::{run_impact, run_recommend};

use std::path::PathBuf;

use svcimpact_core::SnapshotFile;

fn snapshot_path(path: Option<PathBuf>) -> Result<PathBuf, String> {
    match path {
        Some(path) => Ok(path),
        None => {
            let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
            SnapshotFile::locate(&cwd).map_err(|e| e.to_string())
        }
    }
}

/// Load an explicit snapshot file, or discover one from the current directory
fn load_snapshot(path: Option<PathBuf>) -> Result<(PathBuf, SnapshotFile), String> {
    let path = snapshot_path(path)?;
    let file = SnapshotFile::load(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok((path, file))
}

/// Like `load_snapshot`, but leaves settings validation to the caller
fn read_snapshot(path: Option<PathBuf>) -> Result<(PathBuf, SnapshotFile), String> {
    let path = snapshot_path(path)?;
    let file = SnapshotFile::read(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok((path, file))
}
