//! Logging initialization.

use std::io;

use tracing::*;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    fmt::layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

use super::types::LoggerConfig;

/// Builds the env filter, honouring `RUST_LOG` over the configured default.
pub(crate) fn build_filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(config.default_level.into())
        .from_env_lossy()
}

/// Initializes the logging subsystem with the provided config.
///
/// Fails if a global subscriber was already installed.
pub fn init(config: LoggerConfig) -> Result<(), TryInitError> {
    let filt = build_filter(&config);
    let stdout = &config.stdout_config;

    let stdout_sub = match (stdout.json_format, stdout.use_stderr) {
        (true, true) => layer()
            .json()
            .with_writer(io::stderr)
            .with_span_events(stdout.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed(),
        (true, false) => layer()
            .json()
            .with_span_events(stdout.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed(),
        (false, true) => layer()
            .compact()
            .with_writer(io::stderr)
            .with_span_events(stdout.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed(),
        (false, false) => layer()
            .compact()
            .with_span_events(stdout.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed(),
    };

    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );

        if file_config.json_format {
            layer()
                .json()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
        .try_init()?;

    info!(service_name = %config.service_name, "logging initialized");
    if let Some(file_config) = &config.file_logging_config {
        info!(
            log_dir = %file_config.directory.display(),
            log_prefix = %file_config.file_name_prefix,
            "file logging enabled"
        );
    }

    Ok(())
}
