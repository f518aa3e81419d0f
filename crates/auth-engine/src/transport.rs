//! HTTP transport for the four auth operations.
//!
//! Every success body is an envelope `{success, data, message?}`; the
//! transport hands back `data`. Non-2xx statuses are returned as
//! [`AuthError::Status`] without interpretation.
//!
//! Logout is the one authenticated call. Once a [`RequestPipeline`] is
//! attached it goes through the pipeline, so an expired access token is
//! refreshed and the logout replayed like any other protected request.

use crate::models::{
    AuthResponse, AuthTokens, Envelope, LoginRequest, RefreshPayload, RefreshRequest,
    RegisterRequest,
};
use crate::pipeline::{RequestPipeline, WeakRequestPipeline};
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use portal_config_and_utils::{AuthEndpoints, Config};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use session_storage::TokenStore;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use url::Url;

/// Network operations backing authentication.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> AuthResult<AuthResponse>;

    async fn register(&self, request: &RegisterRequest) -> AuthResult<AuthResponse>;

    /// Invalidate the session server-side. Sends the stored bearer token if any.
    async fn logout(&self) -> AuthResult<()>;

    async fn refresh(&self, request: &RefreshRequest) -> AuthResult<AuthTokens>;
}

/// Resolve an API path against the base URL.
///
/// Unlike [`Url::join`], a leading slash keeps the base path, so
/// `http://host/api` + `/auth/login` is `http://host/api/auth/login`.
/// Absolute URLs are returned unchanged.
pub fn resolve_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path);
    }
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{}/{}", base, path))
}

/// Error body shapes seen on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`AuthTransport`] over reqwest.
pub struct HttpAuthTransport {
    client: Client,
    base_url: Url,
    endpoints: AuthEndpoints,
    tokens: Arc<TokenStore>,
    pipeline: OnceLock<WeakRequestPipeline>,
}

impl HttpAuthTransport {
    /// Build a transport with its own client honoring the configured timeout.
    pub fn new(config: &Config, tokens: Arc<TokenStore>) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let base_url = config
            .api_base_url()
            .map_err(|e| AuthError::Config(e.to_string()))?;
        Ok(Self::with_client(
            client,
            base_url,
            config.endpoints.clone(),
            tokens,
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: Url,
        endpoints: AuthEndpoints,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            client,
            base_url,
            endpoints,
            tokens,
            pipeline: OnceLock::new(),
        }
    }

    /// Route authenticated calls through `pipeline`. Only the first call
    /// takes effect.
    pub fn attach_pipeline(&self, pipeline: &RequestPipeline) {
        if self.pipeline.set(pipeline.downgrade()).is_err() {
            debug!("Request pipeline already attached");
        }
    }

    fn pipeline(&self) -> Option<RequestPipeline> {
        self.pipeline.get().and_then(WeakRequestPipeline::upgrade)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> AuthResult<Response> {
        let url = resolve_url(&self.base_url, path)?;
        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        check_status(path, response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body, None).await?;
        let bytes = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        unwrap_envelope(envelope)
    }
}

async fn check_status(path: &str, response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();

    debug!(path = %path, status = status.as_u16(), "Auth request failed");
    Err(AuthError::Status {
        status: status.as_u16(),
        message,
    })
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> AuthResult<T> {
    if !envelope.success {
        return Err(AuthError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| AuthError::Rejected("response contained no data".to_string()))
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn login(&self, request: &LoginRequest) -> AuthResult<AuthResponse> {
        debug!(email = %request.email, "Logging in");
        let response: AuthResponse = self.post(&self.endpoints.login, request).await?;
        info!(user_id = %response.user.id, "Login accepted");
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> AuthResult<AuthResponse> {
        debug!(email = %request.email, "Registering");
        let response: AuthResponse = self.post(&self.endpoints.register, request).await?;
        info!(user_id = %response.user.id, "Registration accepted");
        Ok(response)
    }

    async fn logout(&self) -> AuthResult<()> {
        let path = &self.endpoints.logout;
        let body = serde_json::json!({});
        let response = match self.pipeline() {
            Some(pipeline) => {
                let response = pipeline.post_json(path, &body).await?;
                check_status(path, response).await?
            }
            None => {
                let bearer = self.tokens.get_access_token()?;
                self.send(path, &body, bearer.as_deref()).await?
            }
        };

        // Body is optional here; only an explicit `success: false` is a failure
        let bytes = response.bytes().await?;
        if !bytes.iter().all(u8::is_ascii_whitespace) {
            let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&bytes)?;
            if !envelope.success {
                warn!("Logout rejected by server");
                return Err(AuthError::Rejected(
                    envelope
                        .message
                        .unwrap_or_else(|| "logout was not successful".to_string()),
                ));
            }
        }

        info!("Logged out");
        Ok(())
    }

    async fn refresh(&self, request: &RefreshRequest) -> AuthResult<AuthTokens> {
        debug!("Exchanging refresh token");
        let payload: RefreshPayload = self.post(&self.endpoints.refresh, request).await?;
        Ok(payload.into_tokens())
    }
}
