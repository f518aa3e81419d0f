//! Route guards. They decide; the caller navigates.

use crate::collaborators::Navigator;
use portal_config_and_utils::Routes;
use session_storage::TokenStore;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        path: String,
        /// Where to send the user once they have signed in.
        return_url: Option<String>,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    /// Navigate if this is a redirect. Returns whether access was allowed.
    pub fn apply(&self, navigator: &dyn Navigator) -> bool {
        match self {
            GuardDecision::Allow => true,
            GuardDecision::Redirect { path, return_url } => {
                match return_url {
                    Some(url) => navigator.navigate_to(path, &[("returnUrl", url.as_str())]),
                    None => navigator.navigate_to(path, &[]),
                }
                false
            }
        }
    }
}

fn is_authenticated(tokens: &TokenStore) -> bool {
    tokens.is_authenticated().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to read session, treating as signed out");
        false
    })
}

/// Only signed-in users may enter `target`; others go to the login route.
pub fn auth_guard(tokens: &TokenStore, target: &str, routes: &Routes) -> GuardDecision {
    if is_authenticated(tokens) {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect {
            path: routes.login_route.clone(),
            return_url: Some(target.to_string()),
        }
    }
}

/// Only signed-out users may enter (login and register pages).
pub fn guest_guard(tokens: &TokenStore, routes: &Routes) -> GuardDecision {
    if is_authenticated(tokens) {
        GuardDecision::Redirect {
            path: routes.dashboard_route.clone(),
            return_url: None,
        }
    } else {
        GuardDecision::Allow
    }
}
