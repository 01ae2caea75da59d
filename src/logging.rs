//! Logging setup shared by both binaries: coloured stderr + JSON rolling log file.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process. Fails without installing anything when the
/// log directory cannot be created.
pub fn init(log_file_path: &Path) -> Result<WorkerGuard> {
    let log_dir = log_file_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = log_file_path
        .file_name()
        .unwrap_or(OsStr::new("nvdb_traffic_insights.log"));

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_file_name.to_string_lossy())
        .build(log_dir)
        .with_context(|| format!("cannot open log directory {}", log_dir.display()))?;
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}
