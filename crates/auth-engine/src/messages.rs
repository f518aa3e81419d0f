//! User-facing messages for failures.

use crate::{AuthError, PipelineError};

/// Message shown for an HTTP status. Pure lookup.
pub fn message_for_status(status: u16) -> &'static str {
    match status {
        0 => "Unable to reach the server. Check your connection and try again.",
        400 => "The request was invalid. Please check your input.",
        401 => "Your session has expired. Please sign in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "This conflicts with an existing record.",
        422 => "Some of the submitted data is invalid.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 => "The server encountered an error. Please try again later.",
        502 => "The server is temporarily unreachable. Please try again later.",
        503 => "The service is temporarily unavailable. Please try again later.",
        504 => "The server took too long to respond. Please try again later.",
        _ => "An unexpected error occurred.",
    }
}

/// Human-readable description of a transport failure.
///
/// A message supplied by the server wins over the status table.
pub fn describe_auth_error(error: &AuthError) -> String {
    if let Some(message) = error.server_message() {
        return message.to_string();
    }
    match error {
        AuthError::Http(e) if e.is_connect() || e.is_timeout() => message_for_status(0).to_string(),
        AuthError::Pipeline(e) => describe_pipeline_error(e),
        other => match other.status() {
            Some(status) => message_for_status(status).to_string(),
            None => other.to_string(),
        },
    }
}

/// Human-readable description of a pipeline failure.
pub fn describe_pipeline_error(error: &PipelineError) -> String {
    match error {
        PipelineError::RefreshUnavailable | PipelineError::RefreshRejected(_) => {
            message_for_status(401).to_string()
        }
        PipelineError::RefreshTransient(source) => describe_auth_error(source),
        PipelineError::Http(e) if e.is_connect() || e.is_timeout() => {
            message_for_status(0).to_string()
        }
        other => other.to_string(),
    }
}
