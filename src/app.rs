use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{add_log, start_server};

pub fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let runtime = bootstrap::setup(&config)?;

    actix_web::rt::System::new().block_on(async move {
        let server = start_server(&config, runtime.pipeline.clone(), runtime.logs.clone())?;

        let (host, port) = config.bind_address();
        info!(%host, port, "HTTP server listening");
        add_log(
            &runtime.logs,
            "INFO",
            "System",
            &format!("HTTP server started on {}:{}", host, port),
        );

        server.await
    })?;

    Ok(())
}
