//! Read-only projections of [`AuthState`] for presentation code.

use crate::models::UserProfile;
use crate::reducer::AuthState;
use serde::Serialize;

/// Combined status for a header bar or `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStatusView {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<UserProfile>,
    pub error: Option<String>,
}

pub fn select_user(state: &AuthState) -> Option<&UserProfile> {
    state.user.as_ref()
}

pub fn select_access_token(state: &AuthState) -> Option<&str> {
    state.access_token.as_deref()
}

pub fn select_is_authenticated(state: &AuthState) -> bool {
    state.is_authenticated
}

pub fn select_is_loading(state: &AuthState) -> bool {
    state.is_loading
}

pub fn select_error(state: &AuthState) -> Option<&str> {
    state.error.as_deref()
}

pub fn select_auth_status(state: &AuthState) -> AuthStatusView {
    AuthStatusView {
        is_authenticated: state.is_authenticated,
        is_loading: state.is_loading,
        user: state.user.clone(),
        error: state.error.clone(),
    }
}
