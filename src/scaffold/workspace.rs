use super::error::ScaffoldError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use walkdir::WalkDir;

/// How an existing output directory was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Absent,
    Removed,
    RemovedAfterPermissionFix,
    MovedAside(PathBuf),
}

/// Clears `dir` so it can be recreated from scratch.
///
/// Tries a plain removal, then a removal after making the tree writable,
/// then a rename to `<dir>_backup_<unix seconds>`.
pub fn reset_directory(dir: &Path) -> Result<ResetOutcome, ScaffoldError> {
    if !dir.exists() {
        return Ok(ResetOutcome::Absent);
    }

    let first_error = match fs::remove_dir_all(dir) {
        Ok(()) => {
            info!("Removed old {}", dir.display());
            return Ok(ResetOutcome::Removed);
        }
        Err(e) => e,
    };

    if first_error.kind() == ErrorKind::PermissionDenied {
        make_writable(dir);
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                info!("Removed old {} (with permission fix)", dir.display());
                return Ok(ResetOutcome::RemovedAfterPermissionFix);
            }
            Err(e) => warn!("Could not remove {}: {}", dir.display(), e),
        }
    } else {
        warn!("Could not remove {}: {}", dir.display(), first_error);
    }

    let backup = backup_path(dir);
    fs::rename(dir, &backup).map_err(|e| ScaffoldError::DirectoryLocked {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    warn!("Moved old {} aside to {}", dir.display(), backup.display());
    Ok(ResetOutcome::MovedAside(backup))
}

fn backup_path(dir: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut name = dir.as_os_str().to_os_string();
    name.push(format!("_backup_{}", secs));
    PathBuf::from(name)
}

fn make_writable(dir: &Path) {
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let Ok(metadata) = fs::metadata(path) else {
            continue;
        };
        let mut permissions = metadata.permissions();
        grant_write(&mut permissions, metadata.is_dir());
        if let Err(e) = fs::set_permissions(path, permissions) {
            warn!("Failed to make {} writable: {}", path.display(), e);
        }
    }
}

#[cfg(unix)]
fn grant_write(permissions: &mut fs::Permissions, is_dir: bool) {
    use std::os::unix::fs::PermissionsExt;
    let extra = if is_dir { 0o700 } else { 0o600 };
    permissions.set_mode(permissions.mode() | extra);
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn grant_write(permissions: &mut fs::Permissions, _is_dir: bool) {
    permissions.set_readonly(false);
}

/// Writes `contents` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &Path, contents: &str) -> Result<PathBuf, ScaffoldError> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ScaffoldError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, contents).map_err(|source| ScaffoldError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn create_dirs(dir: &Path, subdirs: &[&str]) -> Result<(), ScaffoldError> {
    for sub in std::iter::once("").chain(subdirs.iter().copied()) {
        let path = dir.join(sub);
        fs::create_dir_all(&path).map_err(|source| ScaffoldError::Write { path, source })?;
    }
    Ok(())
}
