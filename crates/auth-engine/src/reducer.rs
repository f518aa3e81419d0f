//! Auth events and the pure reducer deriving [`AuthState`] from them.

use crate::models::{AuthResponse, AuthTokens, LoginRequest, RegisterRequest, UserProfile};

/// UI-facing authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    /// True only between a request event and its matching outcome.
    pub is_loading: bool,
    /// Human-readable message of the last failure.
    pub error: Option<String>,
}

impl AuthState {
    /// The state before anything has happened.
    pub fn initial() -> Self {
        Self::default()
    }
}

/// Everything that can happen to the auth state.
///
/// Request events carry the user's intent; the effect coordinator answers
/// each with the matching success or failure event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    Login(LoginRequest),
    LoginSuccess(AuthResponse),
    LoginFailure(String),

    Register(RegisterRequest),
    RegisterSuccess(AuthResponse),
    RegisterFailure(String),

    Logout,
    LogoutSuccess,
    LogoutFailure(String),

    RefreshToken,
    RefreshTokenSuccess(AuthTokens),
    RefreshTokenFailure(String),

    LoadFromStorage,
    LoadFromStorageSuccess {
        user: UserProfile,
        access_token: String,
        refresh_token: String,
    },
    LoadFromStorageFailure,

    ClearError,
}

/// Kinds of request event. At most one call per intent is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthIntent {
    Login,
    Register,
    Logout,
    RefreshToken,
    LoadFromStorage,
}

impl AuthEvent {
    /// Stable name for logs. Never includes payloads.
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::Login(_) => "login",
            AuthEvent::LoginSuccess(_) => "login_success",
            AuthEvent::LoginFailure(_) => "login_failure",
            AuthEvent::Register(_) => "register",
            AuthEvent::RegisterSuccess(_) => "register_success",
            AuthEvent::RegisterFailure(_) => "register_failure",
            AuthEvent::Logout => "logout",
            AuthEvent::LogoutSuccess => "logout_success",
            AuthEvent::LogoutFailure(_) => "logout_failure",
            AuthEvent::RefreshToken => "refresh_token",
            AuthEvent::RefreshTokenSuccess(_) => "refresh_token_success",
            AuthEvent::RefreshTokenFailure(_) => "refresh_token_failure",
            AuthEvent::LoadFromStorage => "load_from_storage",
            AuthEvent::LoadFromStorageSuccess { .. } => "load_from_storage_success",
            AuthEvent::LoadFromStorageFailure => "load_from_storage_failure",
            AuthEvent::ClearError => "clear_error",
        }
    }

    /// The intent this event requests, if it is a request event.
    pub fn intent(&self) -> Option<AuthIntent> {
        match self {
            AuthEvent::Login(_) => Some(AuthIntent::Login),
            AuthEvent::Register(_) => Some(AuthIntent::Register),
            AuthEvent::Logout => Some(AuthIntent::Logout),
            AuthEvent::RefreshToken => Some(AuthIntent::RefreshToken),
            AuthEvent::LoadFromStorage => Some(AuthIntent::LoadFromStorage),
            _ => None,
        }
    }

    /// The intent this event settles, if it is a success or failure outcome.
    pub fn settles(&self) -> Option<AuthIntent> {
        match self {
            AuthEvent::LoginSuccess(_) | AuthEvent::LoginFailure(_) => Some(AuthIntent::Login),
            AuthEvent::RegisterSuccess(_) | AuthEvent::RegisterFailure(_) => {
                Some(AuthIntent::Register)
            }
            AuthEvent::LogoutSuccess | AuthEvent::LogoutFailure(_) => Some(AuthIntent::Logout),
            AuthEvent::RefreshTokenSuccess(_) | AuthEvent::RefreshTokenFailure(_) => {
                Some(AuthIntent::RefreshToken)
            }
            AuthEvent::LoadFromStorageSuccess { .. } | AuthEvent::LoadFromStorageFailure => {
                Some(AuthIntent::LoadFromStorage)
            }
            _ => None,
        }
    }
}

/// Apply one event. Pure: no I/O, and equal inputs give equal outputs.
pub fn reduce(state: &AuthState, event: &AuthEvent) -> AuthState {
    match event {
        AuthEvent::Login(_) | AuthEvent::Register(_) => AuthState {
            is_loading: true,
            error: None,
            ..state.clone()
        },

        AuthEvent::LoginSuccess(response) | AuthEvent::RegisterSuccess(response) => AuthState {
            user: Some(response.user.clone()),
            access_token: Some(response.tokens.access_token.clone()),
            refresh_token: Some(response.tokens.refresh_token.clone()),
            is_authenticated: true,
            is_loading: false,
            error: None,
        },

        AuthEvent::LoginFailure(message)
        | AuthEvent::RegisterFailure(message)
        | AuthEvent::LogoutFailure(message) => AuthState {
            is_loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },

        AuthEvent::Logout => AuthState {
            is_loading: true,
            ..state.clone()
        },

        AuthEvent::LogoutSuccess | AuthEvent::RefreshTokenFailure(_) => AuthState::initial(),

        AuthEvent::RefreshTokenSuccess(tokens) => AuthState {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            ..state.clone()
        },

        AuthEvent::LoadFromStorageSuccess {
            user,
            access_token,
            refresh_token,
        } => AuthState {
            user: Some(user.clone()),
            access_token: Some(access_token.clone()),
            refresh_token: Some(refresh_token.clone()),
            is_authenticated: true,
            ..state.clone()
        },

        AuthEvent::ClearError => AuthState {
            error: None,
            ..state.clone()
        },

        AuthEvent::RefreshToken | AuthEvent::LoadFromStorage | AuthEvent::LoadFromStorageFailure => {
            state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            avatar: None,
            theme: None,
        }
    }

    fn tokens(access: &str, refresh: &str) -> AuthTokens {
        AuthTokens {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        }
    }

    fn login_request() -> LoginRequest {
        LoginRequest {
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        }
    }

    fn logged_in() -> AuthState {
        reduce(
            &AuthState::initial(),
            &AuthEvent::LoginSuccess(AuthResponse {
                user: user(),
                tokens: tokens("AT1", "RT1"),
            }),
        )
    }

    /// One of every event, for sweeping properties.
    fn all_events() -> Vec<AuthEvent> {
        vec![
            AuthEvent::Login(login_request()),
            AuthEvent::LoginSuccess(AuthResponse {
                user: user(),
                tokens: tokens("AT1", "RT1"),
            }),
            AuthEvent::LoginFailure("Invalid credentials".to_string()),
            AuthEvent::Register(RegisterRequest {
                name: "A".to_string(),
                email: "a@b.com".to_string(),
                password: "secret1".to_string(),
            }),
            AuthEvent::RegisterSuccess(AuthResponse {
                user: user(),
                tokens: tokens("AT2", "RT2"),
            }),
            AuthEvent::RegisterFailure("Email taken".to_string()),
            AuthEvent::Logout,
            AuthEvent::LogoutSuccess,
            AuthEvent::LogoutFailure("offline".to_string()),
            AuthEvent::RefreshToken,
            AuthEvent::RefreshTokenSuccess(tokens("AT3", "RT3")),
            AuthEvent::RefreshTokenFailure("expired".to_string()),
            AuthEvent::LoadFromStorage,
            AuthEvent::LoadFromStorageSuccess {
                user: user(),
                access_token: "AT4".to_string(),
                refresh_token: "RT4".to_string(),
            },
            AuthEvent::LoadFromStorageFailure,
            AuthEvent::ClearError,
        ]
    }

    /// States worth starting from.
    fn sample_states() -> Vec<AuthState> {
        let mut failed = logged_in();
        failed.error = Some("boom".to_string());
        failed.is_loading = true;

        vec![AuthState::initial(), logged_in(), failed]
    }

    #[test]
    fn test_initial_state() {
        let state = AuthState::initial();
        assert_eq!(state.user, None);
        assert_eq!(state.access_token, None);
        assert_eq!(state.refresh_token, None);
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_login_scenario() {
        let state = reduce(&AuthState::initial(), &AuthEvent::Login(login_request()));
        assert!(state.is_loading);
        assert_eq!(state.error, None);

        let state = reduce(
            &state,
            &AuthEvent::LoginSuccess(AuthResponse {
                user: user(),
                tokens: tokens("AT1", "RT1"),
            }),
        );
        assert_eq!(
            state,
            AuthState {
                user: Some(user()),
                access_token: Some("AT1".to_string()),
                refresh_token: Some("RT1".to_string()),
                is_authenticated: true,
                is_loading: false,
                error: None,
            }
        );
    }

    #[test]
    fn test_request_clears_previous_error() {
        let failed = reduce(
            &AuthState::initial(),
            &AuthEvent::LoginFailure("Invalid credentials".to_string()),
        );
        assert_eq!(failed.error.as_deref(), Some("Invalid credentials"));
        assert!(!failed.is_loading);

        let retry = reduce(&failed, &AuthEvent::Login(login_request()));
        assert_eq!(retry.error, None);
        assert!(retry.is_loading);
    }

    #[test]
    fn test_reduce_is_pure() {
        for state in sample_states() {
            for event in all_events() {
                let before = state.clone();
                let first = reduce(&state, &event);
                let second = reduce(&state, &event);
                assert_eq!(first, second, "{}", event.name());
                assert_eq!(state, before, "{} mutated its input", event.name());
            }
        }
    }

    #[test]
    fn test_composition_depends_only_on_inputs() {
        for state in sample_states() {
            for e1 in all_events() {
                for e2 in [AuthEvent::ClearError, AuthEvent::Logout, AuthEvent::LogoutSuccess] {
                    let a = reduce(&reduce(&state, &e1), &e2);
                    let b = reduce(&reduce(&state.clone(), &e1.clone()), &e2.clone());
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_logout_success_and_refresh_failure_reset_everything() {
        for state in sample_states() {
            assert_eq!(reduce(&state, &AuthEvent::LogoutSuccess), AuthState::initial());
            assert_eq!(
                reduce(&state, &AuthEvent::RefreshTokenFailure("expired".to_string())),
                AuthState::initial()
            );
        }
    }

    #[test]
    fn test_logout_scenario_from_loading_state() {
        let state = reduce(&logged_in(), &AuthEvent::Logout);
        assert!(state.is_loading);
        assert!(state.is_authenticated);

        assert_eq!(reduce(&state, &AuthEvent::LogoutSuccess), AuthState::initial());
    }

    #[test]
    fn test_refresh_success_updates_tokens_only() {
        let prior = logged_in();
        let next = reduce(&prior, &AuthEvent::RefreshTokenSuccess(tokens("AT_NEW", "RT_NEW")));

        assert_eq!(next.access_token.as_deref(), Some("AT_NEW"));
        assert_eq!(next.refresh_token.as_deref(), Some("RT_NEW"));
        assert_eq!(next.user, prior.user);
        assert_eq!(next.is_authenticated, prior.is_authenticated);
        assert_eq!(next.is_loading, prior.is_loading);
        assert_eq!(next.error, prior.error);
    }

    #[test]
    fn test_load_from_storage_success_keeps_loading_and_error() {
        let mut prior = AuthState::initial();
        prior.error = Some("stale".to_string());

        let next = reduce(
            &prior,
            &AuthEvent::LoadFromStorageSuccess {
                user: user(),
                access_token: "AT1".to_string(),
                refresh_token: "RT1".to_string(),
            },
        );

        assert!(next.is_authenticated);
        assert_eq!(next.user, Some(user()));
        assert_eq!(next.error.as_deref(), Some("stale"));
        assert!(!next.is_loading);
    }

    #[test]
    fn test_no_op_events() {
        for state in sample_states() {
            for event in [
                AuthEvent::LoadFromStorageFailure,
                AuthEvent::LoadFromStorage,
                AuthEvent::RefreshToken,
            ] {
                assert_eq!(reduce(&state, &event), state);
            }
        }
    }

    #[test]
    fn test_logout_failure_keeps_session() {
        let state = reduce(&logged_in(), &AuthEvent::Logout);
        let state = reduce(&state, &AuthEvent::LogoutFailure("offline".to_string()));

        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("offline"));
        assert_eq!(state.access_token.as_deref(), Some("AT1"));
    }

    #[test]
    fn test_clear_error() {
        let failed = reduce(&logged_in(), &AuthEvent::LoginFailure("x".to_string()));
        let cleared = reduce(&failed, &AuthEvent::ClearError);
        assert_eq!(cleared.error, None);
        assert_eq!(cleared.user, failed.user);
    }

    #[test]
    fn test_intents() {
        assert_eq!(AuthEvent::Logout.intent(), Some(AuthIntent::Logout));
        assert_eq!(AuthEvent::LoadFromStorage.intent(), Some(AuthIntent::LoadFromStorage));
        assert_eq!(AuthEvent::LogoutSuccess.intent(), None);
        assert_eq!(AuthEvent::ClearError.intent(), None);
        assert_eq!(
            all_events().iter().filter(|e| e.intent().is_some()).count(),
            5
        );
    }

    #[test]
    fn test_every_intent_is_settled_by_two_outcomes() {
        let events = all_events();
        for intent in events.iter().filter_map(AuthEvent::intent) {
            let outcomes = events
                .iter()
                .filter(|e| e.settles() == Some(intent))
                .count();
            assert_eq!(outcomes, 2, "{:?}", intent);
        }
        assert_eq!(AuthEvent::Login(login_request()).settles(), None);
        assert_eq!(AuthEvent::ClearError.settles(), None);
    }
}
