use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::upload::FileKind;

pub fn ensure_upload_dir(upload_dir: &Path) -> io::Result<PathBuf> {
    ensure_dir(upload_dir)?;
    Ok(upload_dir.to_path_buf())
}

/// Create the directory the report is written into
pub fn ensure_report_parent(report_path: &Path) -> io::Result<()> {
    match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Delete a file if it is still there. Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// An upload written into the staging directory.
///
/// The file name is generated per request; the client filename never becomes
/// part of the path. The file is removed when the guard is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
}

impl StagedUpload {
    pub fn write(upload_dir: &Path, kind: FileKind, bytes: &[u8]) -> io::Result<Self> {
        ensure_dir(upload_dir)?;
        let path = upload_dir.join(format!("{}.{}", Uuid::new_v4(), kind.extension()));
        // Guard exists before the write so a partial file is also cleaned up
        let staged = Self { path };
        fs::write(&staged.path, bytes)?;
        debug!(path = %staged.path.display(), size = bytes.len(), "Staged upload");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file now. Safe to call more than once.
    pub fn cleanup(&self) -> io::Result<bool> {
        remove_if_exists(&self.path)
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Err(err) = self.cleanup() {
            warn!(error = %err, path = %self.path.display(), "Failed to remove staged upload");
        }
    }
}
