use std::env;
use std::sync::Arc;

use anyhow::Context;
use prompt2chat::config::{OutputMode, RelayConfig};
use prompt2chat::prompt_config::PromptConfig;
use prompt2chat::server::build_router;
use prompt2chat::util::{env_bind_addr, init_tracing, AppState};
use tokio::net::TcpListener;

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("--{name}=");
    args.iter()
        .find_map(|a| a.strip_prefix(prefix.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config = RelayConfig::from_env();
    if let Some(mode) = flag_value(&args, "output-mode") {
        match mode.parse::<OutputMode>() {
            Ok(m) => config.output_mode = m,
            Err(e) => tracing::warn!("{}; keeping {}", e, config.output_mode),
        }
    }

    let prompts = PromptConfig::load_or_empty(flag_value(&args, "prompt-config"));
    if flag_value(&args, "prompt-config").is_none() {
        tracing::info!(
            "Usage: {} [--prompt-config=prompts.json] [--output-mode=raw|clean]",
            args.first().map(String::as_str).unwrap_or("prompt2chat")
        );
    }

    if config.has_api_key() {
        tracing::info!("Upstream credential loaded");
    } else {
        tracing::warn!("OLLAMA_API_KEY is not set; POST /api/ai will answer 500 until it is");
    }
    tracing::info!(
        upstream = %config.upstream_url,
        model = %config.model,
        output_mode = %config.output_mode,
        timeout_secs = config.timeout.as_secs(),
        "Relay configured"
    );

    let state = Arc::new(AppState::new(config, prompts));
    let app = build_router(state);

    let addr = env_bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("prompt2chat listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
