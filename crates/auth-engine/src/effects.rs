//! Effect coordinator: turns request events into transport calls.
//!
//! Request events (`Login`, `Register`, `Logout`, `RefreshToken`,
//! `LoadFromStorage`) each run as their own task, at most one per intent.
//! Storage writes happen inside that task before the outcome event is
//! dispatched, so once the state says "authenticated" the session is on
//! disk. Navigation and notifications react to the outcome events.

use crate::collaborators::{Navigator, Notifier, Severity};
use crate::messages::describe_auth_error;
use crate::models::{AuthResponse, RefreshRequest};
use crate::reducer::{AuthEvent, AuthIntent};
use crate::store::AuthStore;
use crate::transport::AuthTransport;
use crate::AuthResult;
use parking_lot::Mutex;
use portal_config_and_utils::Routes;
use session_storage::TokenStore;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct EffectCoordinator {
    store: Arc<AuthStore>,
    transport: Arc<dyn AuthTransport>,
    tokens: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    routes: Routes,
    in_flight: Mutex<HashSet<AuthIntent>>,
}

impl EffectCoordinator {
    pub fn new(
        store: Arc<AuthStore>,
        transport: Arc<dyn AuthTransport>,
        tokens: Arc<TokenStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        routes: Routes,
    ) -> Self {
        Self {
            store,
            transport,
            tokens,
            navigator,
            notifier,
            routes,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Attach to the store's lossless feed and process events on a
    /// background task.
    ///
    /// The feed is registered before this returns, so events dispatched
    /// right after `spawn` are not missed.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let events = self.store.feed();
        tokio::spawn(self.run(events))
    }

    /// Process events until the feed closes.
    pub async fn run(self: Arc<Self>, mut events: UnboundedReceiver<AuthEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        debug!("Auth event feed closed");
    }

    /// Returns true while a call for `intent` is running.
    pub fn is_in_flight(&self, intent: AuthIntent) -> bool {
        self.in_flight.lock().contains(&intent)
    }

    fn handle(self: &Arc<Self>, event: AuthEvent) {
        let Some(intent) = event.intent() else {
            self.react(&event);
            return;
        };

        if !self.in_flight.lock().insert(intent) {
            debug!(intent = ?intent, "Suppressing duplicate auth request");
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = this.perform(&event).await;
            this.in_flight.lock().remove(&intent);
            if let Some(outcome) = outcome {
                this.store.dispatch(outcome);
            }
        });
    }

    /// Run the call behind a request event and produce its outcome.
    async fn perform(&self, event: &AuthEvent) -> Option<AuthEvent> {
        let outcome = match event {
            AuthEvent::Login(request) => {
                let result = self.transport.login(request).await;
                self.session_outcome(result, AuthEvent::LoginSuccess, AuthEvent::LoginFailure)
            }
            AuthEvent::Register(request) => {
                let result = self.transport.register(request).await;
                self.session_outcome(
                    result,
                    AuthEvent::RegisterSuccess,
                    AuthEvent::RegisterFailure,
                )
            }
            AuthEvent::Logout => match self.transport.logout().await {
                Ok(()) => {
                    self.clear_session();
                    AuthEvent::LogoutSuccess
                }
                Err(e) if e.session_ended() => {
                    info!("Session already ended while logging out");
                    self.clear_session();
                    AuthEvent::LogoutSuccess
                }
                Err(e) => {
                    warn!(error = %e, "Logout failed, keeping local session");
                    AuthEvent::LogoutFailure(describe_auth_error(&e))
                }
            },
            AuthEvent::RefreshToken => self.refresh().await,
            AuthEvent::LoadFromStorage => self.load_from_storage(),
            _ => return None,
        };
        Some(outcome)
    }

    fn session_outcome(
        &self,
        result: AuthResult<AuthResponse>,
        success: fn(AuthResponse) -> AuthEvent,
        failure: fn(String) -> AuthEvent,
    ) -> AuthEvent {
        let persisted = result.and_then(|response| {
            self.tokens.set_session(
                &response.tokens.access_token,
                &response.tokens.refresh_token,
                &response.user,
            )?;
            Ok(response)
        });

        match persisted {
            Ok(response) => success(response),
            Err(e) => {
                warn!(error = %e, "Authentication failed");
                failure(describe_auth_error(&e))
            }
        }
    }

    async fn refresh(&self) -> AuthEvent {
        let refresh_token = match self.tokens.get_refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("No refresh token available");
                self.clear_session();
                return AuthEvent::RefreshTokenFailure("no refresh token available".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Failed to read refresh token");
                self.clear_session();
                return AuthEvent::RefreshTokenFailure(e.to_string());
            }
        };

        let result = self.transport.refresh(&RefreshRequest { refresh_token }).await;
        let persisted = result.and_then(|tokens| {
            self.tokens
                .set_tokens(&tokens.access_token, &tokens.refresh_token)?;
            Ok(tokens)
        });

        match persisted {
            Ok(tokens) => {
                info!("Access token refreshed");
                AuthEvent::RefreshTokenSuccess(tokens)
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Token refresh failed, keeping stored session");
                AuthEvent::RefreshTokenFailure(describe_auth_error(&e))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.clear_session();
                AuthEvent::RefreshTokenFailure(describe_auth_error(&e))
            }
        }
    }

    fn load_from_storage(&self) -> AuthEvent {
        let session = match self.tokens.load_session() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                return AuthEvent::LoadFromStorageFailure;
            }
        };

        match (session.user, session.access_token, session.refresh_token) {
            (Some(user), Some(access_token), Some(refresh_token)) => {
                debug!(user_id = %user.id, "Restored session from storage");
                AuthEvent::LoadFromStorageSuccess {
                    user,
                    access_token,
                    refresh_token,
                }
            }
            _ => {
                debug!("No complete session in storage");
                AuthEvent::LoadFromStorageFailure
            }
        }
    }

    /// Follow-up effects of outcome events.
    fn react(&self, event: &AuthEvent) {
        match event {
            AuthEvent::LoginSuccess(response) => {
                info!(user_id = %response.user.id, "Logged in");
                self.navigator
                    .navigate_to(&self.routes.dashboard_route, &[]);
                self.notifier.notify(
                    &format!("Welcome back, {}!", response.user.name),
                    Severity::Success,
                );
            }
            AuthEvent::RegisterSuccess(response) => {
                info!(user_id = %response.user.id, "Registered");
                self.navigator
                    .navigate_to(&self.routes.dashboard_route, &[]);
                self.notifier.notify(
                    &format!("Welcome, {}! Your account has been created.", response.user.name),
                    Severity::Success,
                );
            }
            AuthEvent::LogoutSuccess => {
                self.navigator.navigate_to(&self.routes.login_route, &[]);
                self.notifier
                    .notify("You have been signed out.", Severity::Info);
            }
            // A transient failure leaves the stored session for a later retry
            AuthEvent::RefreshTokenFailure(message) => match self.tokens.is_authenticated() {
                Ok(true) => self.notifier.notify(message, Severity::Warning),
                _ => {
                    self.navigator.navigate_to(&self.routes.login_route, &[]);
                    self.notifier.notify(message, Severity::Error);
                }
            },
            AuthEvent::LoginFailure(message)
            | AuthEvent::RegisterFailure(message)
            | AuthEvent::LogoutFailure(message) => {
                self.notifier.notify(message, Severity::Error);
            }
            _ => {}
        }
    }

    fn clear_session(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }
}
