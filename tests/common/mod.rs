#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use prompt2chat::config::{OutputMode, RelayConfig};
use prompt2chat::prompt_config::PromptConfig;
use prompt2chat::server::build_router;
use prompt2chat::util::AppState;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wiremock::MockServer;

/// Path the mock upstream serves Chat Completions on.
pub const UPSTREAM_PATH: &str = "/v1/chat/completions";

/// Credential configured for relays spawned by these helpers.
pub const TEST_API_KEY: &str = "test-upstream-key";

/// The real router bound to an ephemeral local port, with a reqwest client for driving it.
///
/// State is built from an explicit `RelayConfig`, so tests never depend on the
/// process environment for the credential or upstream URL.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    fn make_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .expect("failed building reqwest client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url(path)).json(body).send().await
    }

    /// POST raw bytes, for malformed or empty bodies.
    pub async fn post_bytes(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Relay config pointing at `upstream_base` (a mock server URI) with the test credential.
pub fn test_config(upstream_base: &str) -> RelayConfig {
    RelayConfig {
        api_key: Some(TEST_API_KEY.to_string()),
        upstream_url: format!("{upstream_base}{UPSTREAM_PATH}"),
        timeout: Duration::from_secs(5),
        ..RelayConfig::default()
    }
}

pub fn clean_config(upstream_base: &str) -> RelayConfig {
    RelayConfig {
        output_mode: OutputMode::Clean,
        ..test_config(upstream_base)
    }
}

/// Spawn the application router on an ephemeral port.
pub async fn spawn_relay(config: RelayConfig, prompts: PromptConfig) -> TestServer {
    // Outbound calls go to 127.0.0.1; keep any ambient proxy settings out of the way.
    std::env::set_var("PROMPT2CHAT_NO_PROXY", "1");

    let app = build_router(Arc::new(AppState::new(config, prompts)));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app.into_make_service());

    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url,
        addr,
        join,
        client: TestServer::make_client(),
    }
}

/// Mock upstream plus a relay (raw mode) pointed at it.
pub async fn spawn_with_upstream() -> (MockServer, TestServer) {
    let upstream = MockServer::start().await;
    let relay = spawn_relay(test_config(&upstream.uri()), PromptConfig::empty()).await;
    (upstream, relay)
}

/// Minimal Chat Completions response whose first choice carries `content`.
pub fn chat_completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "llama3.2:1b",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12}
    })
}
