#![allow(dead_code)]

use auth_engine::{HttpAuthTransport, Navigator, Notifier, RequestPipeline, Severity};
use parking_lot::Mutex;
use portal_config_and_utils::Config;
use serde_json::{json, Value};
use session_storage::{MemoryStorage, TokenStore, UserProfile};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

/// Navigator remembering every call.
#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str, _params: &[(&str, &str)]) {
        self.calls.lock().push(path.to_string());
    }
}

/// Notifier remembering every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<(String, Severity)> {
        self.calls.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.calls.lock().push((message.to_string(), severity));
    }
}

/// A pipeline wired to a mock API server.
pub struct Harness {
    pub server: MockServer,
    pub config: Config,
    pub tokens: Arc<TokenStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub transport: Arc<HttpAuthTransport>,
    pub pipeline: RequestPipeline,
}

pub async fn harness() -> Harness {
    let server = MockServer::start().await;
    let config = Config {
        api_base_url: format!("{}/api", server.uri()),
        request_timeout_secs: 5,
        ..Config::default()
    };

    let tokens = Arc::new(TokenStore::new(Box::new(MemoryStorage::new())));
    let navigator = Arc::new(RecordingNavigator::default());
    let transport =
        Arc::new(HttpAuthTransport::new(&config, Arc::clone(&tokens)).expect("transport"));
    let pipeline = RequestPipeline::new(
        &config,
        Arc::clone(&tokens),
        transport.clone(),
        navigator.clone(),
    )
    .expect("pipeline");
    transport.attach_pipeline(&pipeline);

    Harness {
        server,
        config,
        tokens,
        navigator,
        transport,
        pipeline,
    }
}

/// Wrap `data` in a success envelope.
pub fn envelope(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

pub fn user() -> UserProfile {
    UserProfile {
        id: "1".to_string(),
        name: "A".to_string(),
        email: "a@b.com".to_string(),
        avatar: None,
        theme: None,
    }
}

pub fn user_json() -> Value {
    json!({ "id": "1", "name": "A", "email": "a@b.com" })
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
