use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::upload::{FileKind, UploadedFile};
use crate::infrastructure::profiling::{HtmlRenderer, Profiler};
use crate::infrastructure::storage::{ensure_report_parent, StagedUpload};
use crate::infrastructure::tabular::read_table;

/// Validate, stage, parse, profile and render one upload.
///
/// Blocking; callers on an async runtime run it on a blocking thread.
pub struct ReportPipeline {
    upload_dir: PathBuf,
    report_path: PathBuf,
    profiler: Profiler,
}

impl ReportPipeline {
    pub fn new(upload_dir: PathBuf, report_path: PathBuf, profiler: Profiler) -> Self {
        Self {
            upload_dir,
            report_path,
            profiler,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Returns the path of the written report. The staged copy of the upload
    /// is gone by the time this returns, whatever the outcome.
    pub fn execute(&self, upload: &UploadedFile) -> Result<PathBuf> {
        let kind = upload.validate()?;

        let staged = StagedUpload::write(&self.upload_dir, kind, &upload.bytes)?;
        info!(
            filename = %upload.filename,
            staged = %staged.path().display(),
            size = upload.bytes.len(),
            "Processing upload"
        );

        let outcome = self.generate(&staged, &upload.filename, kind);

        if let Err(err) = staged.cleanup() {
            warn!(error = %err, path = %staged.path().display(), "Failed to remove staged upload");
        }

        outcome
    }

    fn generate(
        &self,
        staged: &StagedUpload,
        title: &str,
        kind: FileKind,
    ) -> Result<PathBuf> {
        let table = read_table(staged.path(), kind)?;
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Parsed upload"
        );

        let report = self.profiler.profile(&table, title)?;

        ensure_report_parent(&self.report_path).map_err(|e| {
            AppError::ProfilingError(format!(
                "Failed to prepare report directory for {}: {}",
                self.report_path.display(),
                e
            ))
        })?;
        HtmlRenderer::write_to(&report, &self.report_path)?;

        Ok(self.report_path.clone())
    }
}
