//! Outside services the engine drives: navigation and user notifications.

use tracing::{error, info, warn};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Moves the user to another surface of the application.
pub trait Navigator: Send + Sync {
    /// Navigate to `path` with optional query parameters.
    fn navigate_to(&self, path: &str, params: &[(&str, &str)]);
}

/// Shows a transient message to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Navigator that only records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to(&self, path: &str, params: &[(&str, &str)]) {
        info!(path = %path, params = ?params, "Navigation requested");
    }
}

/// Notifier that writes notifications to the log at a matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(context = "notification", "{}", message),
            Severity::Warning => warn!(context = "notification", "{}", message),
            Severity::Success | Severity::Info => {
                info!(context = "notification", severity = ?severity, "{}", message)
            }
        }
    }
}
