//! Authentication engine for the Portal client.
//!
//! This crate provides:
//! - An HTTP transport for login, register, logout and token refresh
//! - A request pipeline that attaches bearer tokens and refreshes an
//!   expired access token once per batch of concurrent 401s
//! - A pure reducer, event store and selectors for UI-facing auth state
//! - An effect coordinator bridging request events to the transport
//! - Route guards and status-to-message mapping for presentation code

mod collaborators;
mod effects;
mod error;
mod guards;
pub mod messages;
mod models;
mod pipeline;
mod reducer;
mod refresh_fsm;
mod selectors;
mod store;
mod transport;

pub use collaborators::{Navigator, Notifier, Severity, TracingNavigator, TracingNotifier};
pub use effects::EffectCoordinator;
pub use error::{AuthError, AuthResult, PipelineError};
pub use guards::{auth_guard, guest_guard, GuardDecision};
pub use models::{
    AuthResponse, AuthTokens, Envelope, LoginRequest, RefreshRequest, RegisterRequest,
    UserProfile,
};
pub use pipeline::{PipelineResult, RequestPipeline, WeakRequestPipeline};
pub use reducer::{reduce, AuthEvent, AuthIntent, AuthState};
pub use refresh_fsm::refresh_machine;
pub use refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState, RefreshPhase};
pub use selectors::{
    select_access_token, select_auth_status, select_error, select_is_authenticated,
    select_is_loading, select_user, AuthStatusView,
};
pub use store::AuthStore;
pub use transport::{resolve_url, AuthTransport, HttpAuthTransport};
