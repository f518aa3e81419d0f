//! CLI command implementations.

mod auth;
mod request;

pub use auth::{login, logout, register, status};
pub use request::get;

use crate::output::OutputFormat;
use anyhow::Result;
use auth_engine::{
    AuthEvent, AuthState, AuthStore, AuthTransport, EffectCoordinator, HttpAuthTransport,
    Navigator, RequestPipeline, TracingNavigator, TracingNotifier,
};
use portal_config_and_utils::{Config, Paths};
use session_storage::{FileStorage, TokenStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Turns navigation requests into hints for the person at the terminal.
pub struct ConsoleNavigator {
    login_route: String,
    format: OutputFormat,
}

impl Navigator for ConsoleNavigator {
    fn navigate_to(&self, path: &str, params: &[(&str, &str)]) {
        debug!(path = %path, params = ?params, "Navigation requested");
        if path == self.login_route && self.format == OutputFormat::Text {
            eprintln!("Sign in with 'portal login' to continue.");
        }
    }
}

/// Everything a command needs, wired once per invocation.
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub tokens: Arc<TokenStore>,
    pub store: Arc<AuthStore>,
    pub pipeline: RequestPipeline,
    pub navigator: Arc<ConsoleNavigator>,
    coordinator: JoinHandle<()>,
}

impl Context {
    /// Load config, open the session file and start the effect coordinator.
    ///
    /// Must be called from inside the Tokio runtime.
    pub fn build(paths: &Paths, api_url: Option<String>, format: OutputFormat) -> Result<Self> {
        let mut config = Config::load(paths)?;
        if let Some(api_url) = api_url {
            config.api_base_url = api_url;
            config.validate()?;
        }

        paths.ensure_dirs()?;
        let storage = FileStorage::open(paths.session_file())?;
        let tokens = Arc::new(TokenStore::new(Box::new(storage)));

        let http = Arc::new(HttpAuthTransport::new(&config, Arc::clone(&tokens))?);
        let transport: Arc<dyn AuthTransport> = http.clone();
        let navigator = Arc::new(ConsoleNavigator {
            login_route: config.routes.login_route.clone(),
            format,
        });
        let pipeline = RequestPipeline::new(
            &config,
            Arc::clone(&tokens),
            Arc::clone(&transport),
            navigator.clone(),
        )?;
        http.attach_pipeline(&pipeline);

        // The coordinator's own navigation and notifications go to the log;
        // commands report outcomes from the settled state instead.
        let store = Arc::new(AuthStore::new());
        let coordinator = Arc::new(EffectCoordinator::new(
            Arc::clone(&store),
            transport,
            Arc::clone(&tokens),
            Arc::new(TracingNavigator),
            Arc::new(TracingNotifier),
            config.routes.clone(),
        ))
        .spawn();

        debug!(api_base_url = %config.api_base_url, "CLI context ready");

        Ok(Self {
            config,
            format,
            tokens,
            store,
            pipeline,
            navigator,
            coordinator,
        })
    }

    /// Dispatch `event` and wait for the outcome that settles it.
    pub async fn settle(&self, event: AuthEvent) -> AuthState {
        let Some(intent) = event.intent() else {
            self.store.dispatch(event);
            return self.store.state();
        };

        let mut events = self.store.feed();
        self.store.dispatch(event);
        while let Some(event) = events.recv().await {
            if event.settles() == Some(intent) {
                break;
            }
        }
        self.store.state()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.coordinator.abort();
    }
}
