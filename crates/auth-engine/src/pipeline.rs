//! Authenticated request pipeline.
//!
//! Every outbound request goes through [`RequestPipeline::execute`]:
//!
//! 1. Public endpoints are forwarded untouched.
//! 2. Anything else gets `Authorization: Bearer <access token>` when one is
//!    stored.
//! 3. A 401 on a protected request starts (or joins) the single in-flight
//!    refresh exchange, then replays the request once with the new token.
//!
//! The refresh slot is a `parking_lot` mutex that is never held across an
//! await. The exchange itself is a shared future; every request that hits a
//! 401 during the same cycle awaits the same outcome.

use crate::collaborators::Navigator;
use crate::models::{AuthTokens, RefreshRequest};
use crate::refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshPhase};
use crate::transport::{resolve_url, AuthTransport};
use crate::{AuthError, PipelineError};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use portal_config_and_utils::Config;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use session_storage::TokenStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};
use url::Url;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone)]
enum RefreshFailure {
    Rejected(Arc<AuthError>),
    Transient(Arc<AuthError>),
}

impl From<RefreshFailure> for PipelineError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::Rejected(e) => PipelineError::RefreshRejected(e),
            RefreshFailure::Transient(e) => PipelineError::RefreshTransient(e),
        }
    }
}

type RefreshOutcome = Result<AuthTokens, RefreshFailure>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// In-flight refresh plus the phase machine guarding it.
///
/// `in_flight` is `Some` exactly when the machine is `Refreshing`.
struct RefreshSlot {
    machine: RefreshMachine,
    in_flight: Option<SharedRefresh>,
}

struct PipelineInner {
    client: Client,
    base_url: Url,
    public_endpoints: Vec<String>,
    login_route: String,
    tokens: Arc<TokenStore>,
    transport: Arc<dyn AuthTransport>,
    navigator: Arc<dyn Navigator>,
    slot: Mutex<RefreshSlot>,
    refresh_cycles: AtomicU64,
}

/// Sends requests with the current bearer token and recovers from a single
/// access-token expiry. Cheap to clone; clones share the refresh slot.
#[derive(Clone)]
pub struct RequestPipeline {
    inner: Arc<PipelineInner>,
}

/// Non-owning handle to a [`RequestPipeline`].
///
/// The pipeline owns its transport; a transport that needs to send through
/// the pipeline holds this instead so the two do not keep each other alive.
#[derive(Clone)]
pub struct WeakRequestPipeline {
    inner: Weak<PipelineInner>,
}

impl WeakRequestPipeline {
    pub fn upgrade(&self) -> Option<RequestPipeline> {
        self.inner.upgrade().map(|inner| RequestPipeline { inner })
    }
}

impl RequestPipeline {
    /// Build a pipeline with its own HTTP client honoring the configured timeout.
    pub fn new(
        config: &Config,
        tokens: Arc<TokenStore>,
        transport: Arc<dyn AuthTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(client, config, tokens, transport, navigator)
    }

    pub fn with_client(
        client: Client,
        config: &Config,
        tokens: Arc<TokenStore>,
        transport: Arc<dyn AuthTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> PipelineResult<Self> {
        let base_url = Url::parse(&config.api_base_url)?;
        Ok(Self {
            inner: Arc::new(PipelineInner {
                client,
                base_url,
                public_endpoints: config.public_endpoints.clone(),
                login_route: config.routes.login_route.clone(),
                tokens,
                transport,
                navigator,
                slot: Mutex::new(RefreshSlot {
                    machine: RefreshMachine::new(),
                    in_flight: None,
                }),
                refresh_cycles: AtomicU64::new(0),
            }),
        })
    }

    pub fn downgrade(&self) -> WeakRequestPipeline {
        WeakRequestPipeline {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current phase of the refresh slot.
    pub fn refresh_phase(&self) -> RefreshPhase {
        RefreshPhase::from(self.inner.slot.lock().machine.state())
    }

    /// Number of refresh exchanges started by this pipeline.
    pub fn refresh_cycles(&self) -> u64 {
        self.inner.refresh_cycles.load(Ordering::Relaxed)
    }

    /// Returns true when `url` is on the public allow-list.
    pub fn is_public(&self, url: &Url) -> bool {
        self.inner.is_public(url)
    }

    /// Resolve an API path against the configured base URL.
    pub fn url(&self, path: &str) -> PipelineResult<Url> {
        Ok(resolve_url(&self.inner.base_url, path)?)
    }

    /// Start a request for `path`; finish it with [`RequestBuilder::build`]
    /// and hand it to [`execute`](Self::execute).
    pub fn request(&self, method: Method, path: &str) -> PipelineResult<RequestBuilder> {
        Ok(self.inner.client.request(method, self.url(path)?))
    }

    pub async fn get(&self, path: &str) -> PipelineResult<Response> {
        let request = self.request(Method::GET, path)?.build()?;
        self.execute(request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> PipelineResult<Response> {
        let request = self.request(Method::POST, path)?.json(body).build()?;
        self.execute(request).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> PipelineResult<Response> {
        let request = self.request(Method::PUT, path)?.json(body).build()?;
        self.execute(request).await
    }

    pub async fn delete(&self, path: &str) -> PipelineResult<Response> {
        let request = self.request(Method::DELETE, path)?.build()?;
        self.execute(request).await
    }

    /// Send `request`, recovering once from an expired access token.
    ///
    /// Any response other than a 401 on a protected endpoint comes back as
    /// `Ok`, whatever its status.
    pub async fn execute(&self, request: Request) -> PipelineResult<Response> {
        let inner = &self.inner;

        if inner.is_public(request.url()) {
            debug!(
                method = %request.method(),
                path = %request.url().path(),
                "Forwarding public request"
            );
            return Ok(inner.client.execute(request).await?);
        }

        let method = request.method().clone();
        let path = request.url().path().to_string();
        let replay = request.try_clone();
        let sent_token = inner.tokens.get_access_token()?;

        let response = inner.send(request, sent_token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(method = %method, path = %path, "Protected request unauthorized");
        let access_token = self.recover_access_token(sent_token.as_deref()).await?;

        let Some(replay) = replay else {
            warn!(method = %method, path = %path, "Request body cannot be replayed");
            return Err(PipelineError::NotReplayable);
        };

        debug!(method = %method, path = %path, "Replaying request with refreshed token");
        Ok(inner.send(replay, Some(&access_token)).await?)
    }

    /// Produce an access token to replay with after a 401.
    async fn recover_access_token(&self, sent_token: Option<&str>) -> PipelineResult<String> {
        let inner = &self.inner;

        let refresh = {
            let mut slot = inner.slot.lock();

            if let Some(in_flight) = slot.in_flight.clone() {
                debug!("Joining in-flight token refresh");
                in_flight
            } else {
                // A refresh finished between sending and receiving the 401
                if let Some(current) = inner
                    .tokens
                    .get_access_token()?
                    .filter(|current| Some(current.as_str()) != sent_token)
                {
                    debug!("Access token changed since request was sent, skipping refresh");
                    return Ok(current);
                }

                let Some(refresh_token) = inner.tokens.get_refresh_token()? else {
                    drop(slot);
                    warn!("No refresh token available, ending session");
                    inner.end_session();
                    return Err(PipelineError::RefreshUnavailable);
                };

                if slot
                    .machine
                    .consume(&RefreshMachineInput::RefreshStarted)
                    .is_err()
                {
                    warn!(state = ?slot.machine.state(), "Refresh slot out of sync with phase");
                }

                let cycle = inner.refresh_cycles.fetch_add(1, Ordering::Relaxed) + 1;
                info!(cycle, "Starting token refresh");

                let exchange = run_refresh(Arc::clone(inner), refresh_token)
                    .boxed()
                    .shared();
                slot.in_flight = Some(exchange.clone());
                exchange
            }
        };

        let tokens = refresh.await?;
        Ok(tokens.access_token)
    }
}

impl PipelineInner {
    fn is_public(&self, url: &Url) -> bool {
        let path = url.path();
        self.public_endpoints
            .iter()
            .any(|endpoint| path.ends_with(endpoint.as_str()))
    }

    async fn send(&self, mut request: Request, access_token: Option<&str>) -> reqwest::Result<Response> {
        if let Some(token) = access_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored access token is not a valid header value, sending without it"),
            }
        }
        self.client.execute(request).await
    }

    /// Drop the stored session and send the user to sign in.
    fn end_session(&self) {
        if let Err(e) = self.tokens.clear() {
            error!(error = %e, "Failed to clear session");
        }
        self.navigator.navigate_to(&self.login_route, &[]);
    }

    fn finish_refresh(&self) {
        let mut slot = self.slot.lock();
        slot.in_flight = None;
        if slot
            .machine
            .consume(&RefreshMachineInput::RefreshCompleted)
            .is_err()
        {
            warn!(state = ?slot.machine.state(), "Refresh completed while idle");
        }
    }
}

/// One refresh exchange. Runs once per cycle no matter how many requests
/// await it, so its side effects happen once too.
async fn run_refresh(inner: Arc<PipelineInner>, refresh_token: String) -> RefreshOutcome {
    let request = RefreshRequest { refresh_token };

    let outcome = match inner.transport.refresh(&request).await {
        Ok(tokens) => match inner
            .tokens
            .set_tokens(&tokens.access_token, &tokens.refresh_token)
        {
            Ok(()) => {
                info!("Access token refreshed");
                Ok(tokens)
            }
            Err(e) => {
                error!(error = %e, "Failed to persist refreshed tokens");
                Err(RefreshFailure::Transient(Arc::new(AuthError::Storage(e))))
            }
        },
        Err(e) if e.is_unauthorized() => {
            warn!("Refresh token rejected, ending session");
            inner.end_session();
            Err(RefreshFailure::Rejected(Arc::new(e)))
        }
        Err(e) => {
            warn!(error = %e, "Token refresh failed, keeping session");
            Err(RefreshFailure::Transient(Arc::new(e)))
        }
    };

    inner.finish_refresh();
    outcome
}
