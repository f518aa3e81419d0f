//! Core types, configuration, and utilities for the Portal client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    AuthEndpoints, Config, Routes, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging_for_service;
pub use paths::Paths;
