use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::cleanup::clean_model_output;
use crate::config::OutputMode;
use crate::conversion::{first_choice_text, to_chat_request};
use crate::error::RelayError;
use crate::models::chat::ChatCompletionResponse;
use crate::models::prompt::PromptRequest;
use crate::util::{cors_layer_from_env, passthrough_response, AppState};

/// Path of the relay endpoint.
pub const AI_ROUTE: &str = "/api/ai";

/// Body returned by `GET /api/ai`.
pub const LIVENESS_MESSAGE: &str = "AI endpoint is live. Use POST to chat.";

/// Build the Axum router with `/status` and `/api/ai`.
///
/// `/api/ai` answers GET (liveness) and POST (relay); any other method gets a JSON 405.
/// HEAD is routed explicitly, otherwise axum would serve it with the GET handler.
/// OPTIONS never reaches the router: the CORS layer answers it with the preflight headers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let ai = get(liveness)
        .head(method_not_allowed)
        .post(relay)
        .fallback(method_not_allowed);

    Router::new()
        .route("/status", get(status))
        .route(AI_ROUTE, ai)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer_from_env()),
        )
}

/// Service status endpoint exposing the relay's effective settings (never the credential).
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let routes = vec!["/status", AI_ROUTE];
    Json(serde_json::json!({
        "name": "prompt2chat",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": routes,
        "model": state.config.model,
        "output_mode": state.config.output_mode.to_string(),
        "credential_configured": state.config.has_api_key(),
    }))
}

async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": LIVENESS_MESSAGE }))
}

async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

/// Relay a prompt upstream. Each call gets its own `request_id` span.
async fn relay(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let span = tracing::info_span!("relay", request_id = %Uuid::new_v4());
    async move {
        match relay_prompt(&state, &body).await {
            Ok(resp) => resp,
            Err(e) => {
                match &e {
                    RelayError::Upstream { status, .. } => {
                        tracing::warn!(status = %status, "upstream returned an error; passing it through")
                    }
                    other => tracing::error!(error = %other, "relay failed"),
                }
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Validate the request, call the upstream once, and shape the reply per `OutputMode`.
///
/// The credential is checked before the body is parsed, and before any outbound call.
pub async fn relay_prompt(state: &AppState, body: &[u8]) -> Result<Response, RelayError> {
    let api_key = state
        .config
        .api_key
        .as_deref()
        .ok_or(RelayError::MissingApiKey)?;

    let req =
        PromptRequest::from_body(body).map_err(|e| RelayError::InvalidBody(e.to_string()))?;
    let payload = to_chat_request(&req, &state.config, &state.prompts);

    tracing::debug!(
        model = %payload.model,
        prompt_len = req.prompt.len(),
        system_override = req.system_override().is_some(),
        "forwarding prompt upstream"
    );

    let upstream = state
        .http
        .post(&state.config.upstream_url)
        .bearer_auth(api_key)
        .timeout(state.config.timeout)
        .json(&payload)
        .send()
        .await?;

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await?;

    if !status.is_success() {
        return Err(RelayError::Upstream {
            status,
            content_type,
            body: bytes,
        });
    }

    tracing::info!(status = %status, bytes = bytes.len(), "upstream call succeeded");

    match state.config.output_mode {
        OutputMode::Raw => Ok(passthrough_response(status, content_type, bytes)),
        OutputMode::Clean => {
            let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)
                .map_err(|e| RelayError::Decode(format!("invalid upstream response: {e}")))?;
            let text = first_choice_text(&parsed).unwrap_or_default();
            let value = clean_model_output(text, state.prompts.fallback());
            Ok(Json(value).into_response())
        }
    }
}
