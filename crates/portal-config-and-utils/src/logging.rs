//! Logging initialization for the Portal client.
//!
//! Thin wrapper over the observability crate so every binary configures
//! tracing the same way.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for `service_name`.
///
/// Log level comes from `RUST_LOG` when set, otherwise from `level`. When
/// `PORTAL_LOG_FILE` is set to a non-empty value, structured JSONL is also
/// appended to `~/.portal/logs/portal.jsonl`.
pub fn init_logging_for_service(service_name: &str, level: &str, paths: &Paths) {
    let log_path = std::env::var("PORTAL_LOG_FILE")
        .ok()
        .and_then(non_empty_env)
        .map(|_| paths.log_file());

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path,
        also_stderr: true,
    });
}

fn non_empty_env(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
