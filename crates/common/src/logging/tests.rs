//! Unit tests for the logging subsystem.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use super::{manager::build_filter, types::*, Rotation};

#[test]
fn test_logger_config_defaults() {
    let config = LoggerConfig::new("test-service".to_string());
    assert_eq!(config.service_name, "test-service");
    assert_eq!(config.default_level, LevelFilter::INFO);
    assert!(!config.stdout_config.json_format);
    assert!(!config.stdout_config.use_stderr);
    assert!(config.file_logging_config.is_none());
}

#[test]
fn test_logger_config_builder_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::new("test-service".to_string())
        .with_default_level(LevelFilter::WARN)
        .with_json_logging(true)
        .with_stderr(true)
        .with_fmt_span(FmtSpan::CLOSE)
        .with_file_logging(
            FileLoggingConfig::new(dir.path().to_path_buf(), "bridge".to_string())
                .with_rotation(Rotation::HOURLY)
                .with_json_format(true),
        );

    assert_eq!(config.default_level, LevelFilter::WARN);
    assert!(config.stdout_config.json_format);
    assert!(config.stdout_config.use_stderr);

    let file = config.file_logging_config.unwrap();
    assert_eq!(file.directory, dir.path());
    assert_eq!(file.file_name_prefix, "bridge");
    assert!(file.json_format);
}

#[test]
fn test_filter_uses_default_level() {
    // Only meaningful when RUST_LOG is not set by the harness.
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let config = LoggerConfig::default().with_default_level(LevelFilter::DEBUG);
    let filter = build_filter(&config);
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
}
