use std::time::Duration;

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::RelayConfig;
use crate::prompt_config::PromptConfig;

/// Initialize dotenv and structured tracing based on RUST_LOG.
///
/// - Explicit env file paths via ENV_FILE, ENVFILE, DOTENV_PATH are tried first
/// - Falls back to .env discovery from the working directory
/// - Existing process variables are never overwritten
/// - Logs the source used
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "ENVFILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    // RUST_LOG may come from the env file, so the filter is built afterwards.
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8088.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into())
}

fn env_truthy(key: &str) -> bool {
    std::env::var(key)
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "1" || v == "true" || v == "yes" || v == "on"
        })
        .unwrap_or(false)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Shared application state used by the HTTP server and handlers. Immutable after startup.
pub struct AppState {
    pub http: reqwest::Client,
    pub config: RelayConfig,
    pub prompts: PromptConfig,
}

impl AppState {
    pub fn new(config: RelayConfig, prompts: PromptConfig) -> Self {
        Self {
            http: build_http_client(config.timeout),
            config,
            prompts,
        }
    }
}

/// Build the upstream HTTP client with the given timeout, honoring proxy environment variables.
///
/// Environment:
/// - PROMPT2CHAT_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - PROMPT2CHAT_PROXY_URL = <url>         -> proxy for all schemes
/// - HTTP_PROXY / http_proxy               -> HTTP proxy
/// - HTTPS_PROXY / https_proxy             -> HTTPS proxy
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if env_truthy("PROMPT2CHAT_NO_PROXY") {
        builder = builder.no_proxy();
    } else {
        let proxies: [(Option<String>, fn(String) -> reqwest::Result<reqwest::Proxy>); 3] = [
            (env_nonempty("PROMPT2CHAT_PROXY_URL"), reqwest::Proxy::all::<String>),
            (
                env_nonempty("HTTP_PROXY").or_else(|| env_nonempty("http_proxy")),
                reqwest::Proxy::http::<String>,
            ),
            (
                env_nonempty("HTTPS_PROXY").or_else(|| env_nonempty("https_proxy")),
                reqwest::Proxy::https::<String>,
            ),
        ];
        for (url, make) in proxies {
            let Some(url) = url else { continue };
            match make(url.clone()) {
                Ok(p) => builder = builder.proxy(p),
                Err(e) => tracing::warn!(proxy = %url, error = %e, "ignoring invalid proxy URL"),
            }
        }
    }

    builder = builder.user_agent(format!("prompt2chat/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to build configured HTTP client; using defaults");
        reqwest::Client::new()
    })
}

/// Build a JSON error response with the given HTTP status and message.
pub fn error_response(status: StatusCode, msg: &str) -> Response {
    let body = serde_json::json!({ "error": msg });
    (status, axum::Json(body)).into_response()
}

/// Parse a comma-separated env list. `None` means "any" (unset, "*", or nothing valid).
fn env_list<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let raw = std::env::var(key).ok()?;
    let s = raw.trim();
    if s == "*" {
        return None;
    }
    let vals: Vec<T> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(parse)
        .collect();
    (!vals.is_empty()).then_some(vals)
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins (e.g., "https://a.com, https://b.com")
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods (default "GET,POST,OPTIONS")
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
/// - CORS_ALLOW_CREDENTIALS: enable with 1,true,yes,on
/// - CORS_MAX_AGE: max age in seconds (u64)
///
/// Origins and headers default to Any. With credentials enabled, wildcards are
/// replaced by mirroring the request, since browsers reject `*` alongside credentials.
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

    let credentials = env_truthy("CORS_ALLOW_CREDENTIALS");
    let mut layer = CorsLayer::new().allow_credentials(credentials);

    layer = match env_list("CORS_ALLOWED_ORIGINS", |p| http::HeaderValue::from_str(p).ok()) {
        Some(origins) => layer.allow_origin(AllowOrigin::list(origins)),
        None if credentials => layer.allow_origin(AllowOrigin::mirror_request()),
        None => layer.allow_origin(Any),
    };

    let methods = match std::env::var("CORS_ALLOWED_METHODS") {
        Err(_) => Some(vec![http::Method::GET, http::Method::POST, http::Method::OPTIONS]),
        Ok(_) => env_list("CORS_ALLOWED_METHODS", |p| {
            http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok()
        }),
    };
    layer = match methods {
        Some(methods) => layer.allow_methods(AllowMethods::list(methods)),
        None if credentials => layer.allow_methods(AllowMethods::mirror_request()),
        None => layer.allow_methods(Any),
    };

    layer = match env_list("CORS_ALLOWED_HEADERS", |p| {
        http::header::HeaderName::try_from(p).ok()
    }) {
        Some(headers) => layer.allow_headers(AllowHeaders::list(headers)),
        None if credentials => layer.allow_headers(AllowHeaders::mirror_request()),
        None => layer.allow_headers(Any),
    };

    if let Some(n) = env_nonempty("CORS_MAX_AGE").and_then(|s| s.parse::<u64>().ok()) {
        layer = layer.max_age(Duration::from_secs(n));
    }

    layer
}

/// Relay an upstream answer as-is: same status, same bytes, same content type.
pub fn passthrough_response(
    status: StatusCode,
    content_type: Option<http::HeaderValue>,
    body: bytes::Bytes,
) -> Response {
    let mut resp = (status, body).into_response();
    if let Some(ct) = content_type {
        resp.headers_mut().insert(http::header::CONTENT_TYPE, ct);
    }
    resp
}
