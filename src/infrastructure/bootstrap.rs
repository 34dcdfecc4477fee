use std::error::Error;
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::application::use_cases::report_pipeline::ReportPipeline;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::profiling::Profiler;
use crate::infrastructure::storage::{ensure_report_parent, ensure_upload_dir};
use crate::interfaces::http::{add_log, LogEntry};

/// Everything the HTTP layer needs, built once at startup
pub struct Runtime {
    pub pipeline: Arc<ReportPipeline>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

pub fn setup(config: &AppConfig) -> Result<Runtime, Box<dyn Error>> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let upload_dir = ensure_upload_dir(&config.upload_dir()).map_err(|err| {
        error!(
            error = %err,
            upload_dir = %config.upload_dir().display(),
            "Failed to create upload dir"
        );
        err
    })?;

    let report_path = config.report_path();
    ensure_report_parent(&report_path).map_err(|err| {
        error!(
            error = %err,
            report_path = %report_path.display(),
            "Failed to create report dir"
        );
        err
    })?;

    add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "Staging uploads in {}, writing reports to {}",
            upload_dir.display(),
            report_path.display()
        ),
    );

    let pipeline = ReportPipeline::new(upload_dir, report_path, Profiler::default());

    Ok(Runtime {
        pipeline: Arc::new(pipeline),
        logs,
    })
}
