// server.rs — The request orchestrator.
//
// One handler fuses the whole tool-call pipeline: header parsing, body
// capture, parameter fingerprinting, policy evaluation, audit emission,
// and adapter forwarding. The policy check runs before the adapter
// lookup — a tool nobody is authorized for denies through the no-match
// path instead of revealing which adapters exist.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{info, warn, Instrument};

use aegis_audit::{hash_value, AuditEmitter, AuditRecord};
use aegis_policy::{Evaluator, PolicyStore};

use crate::adapters::AdapterRouter;
use crate::error::ApiError;
use crate::telemetry::RequestSpan;

/// Hard deadline for one adapter round trip.
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PolicyStore>,
    pub evaluator: Arc<Evaluator>,
    pub adapters: Arc<AdapterRouter>,
    pub emitter: Arc<AuditEmitter>,
    /// Pooled client reused across requests.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        store: Arc<PolicyStore>,
        adapters: Arc<AdapterRouter>,
        emitter: Arc<AuditEmitter>,
    ) -> Self {
        Self {
            store,
            evaluator: Arc::new(Evaluator::new()),
            adapters,
            emitter,
            http: reqwest::Client::new(),
        }
    }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tools/{tool}/{action}", post(handle_tool_call))
        .route("/health", get(health))
        .route("/policies/reload", post(reload_policies))
        .with_state(state)
}

async fn handle_tool_call(
    State(state): State<AppState>,
    Path((tool, action)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request = RequestSpan::begin(&tool, &action);
    let span = request.span.clone();
    run_tool_call(state, tool, action, headers, body, request)
        .instrument(span)
        .await
}

async fn run_tool_call(
    state: AppState,
    tool: String,
    action: String,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
    request: RequestSpan,
) -> Response {
    let agent = header_value(&headers, "x-agent-id");
    let parent_agent = match header_value(&headers, "x-parent-agent") {
        parent if parent.is_empty() => None,
        parent => Some(parent),
    };

    // Identity unknown: reject without an audit record.
    if agent.is_empty() {
        return ApiError::missing_header("X-Agent-ID header is required").into_response();
    }

    let body = match body {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            return ApiError::invalid_request(None).into_response();
        }
    };

    // The body must be a JSON mapping; no decision is reached (and no
    // audit emitted) for a body we could not parse.
    let params: Map<String, Value> = match serde_json::from_slice(&body) {
        Ok(params) => params,
        Err(_) => {
            return ApiError::invalid_request(Some("Request body must be valid JSON".to_string()))
                .into_response()
        }
    };

    let params_hash = hash_value(&Value::Object(params.clone()));

    let snapshot = state.store.snapshot();
    let decision = state
        .evaluator
        .evaluate(&snapshot, &agent, &tool, &action, &params);
    let latency_ms = request.latency_ms();
    request.record_decision(
        &agent,
        &decision,
        &params_hash,
        latency_ms,
        parent_agent.as_deref(),
    );

    state.emitter.emit(&AuditRecord {
        timestamp: Utc::now(),
        trace_id: request.trace_id.clone(),
        agent_id: agent.clone(),
        tool: tool.clone(),
        action: action.clone(),
        decision_allow: decision.allow,
        reason: decision.reason.clone(),
        policy_version: decision.version,
        params_hash,
        latency_ms,
        parent_agent,
    });

    if !decision.allow {
        return ApiError::policy_violation(decision.reason).into_response();
    }

    let base = match state.adapters.resolve(&tool) {
        Some(base) => base,
        None => return ApiError::adapter_not_found(&tool).into_response(),
    };
    let url = AdapterRouter::target_url(base, &action);

    // Forward the original bytes, not a re-serialization of the parsed
    // map — adapters may be sensitive to numeric formatting, and the
    // audit digest corresponds to what was actually sent.
    let outcome = state
        .http
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .timeout(ADAPTER_TIMEOUT)
        .send()
        .await;

    match outcome {
        Ok(upstream) => relay(upstream).await,
        Err(err) => ApiError::adapter_error(err.to_string()).into_response(),
    }
}

/// Relay the adapter's status and body verbatim.
async fn relay(upstream: reqwest::Response) -> Response {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    match upstream.bytes().await {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(err) => ApiError::adapter_error(err.to_string()).into_response(),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn reload_policies(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || store.reload()).await {
        Ok(Ok(count)) => {
            info!(policies = count, "manual policy reload");
            Json(json!({ "status": "reloaded" })).into_response()
        }
        Ok(Err(err)) => {
            warn!(error = %err, "manual policy reload failed");
            ApiError::reload_failed("failed to reload policy directory").into_response()
        }
        Err(err) => {
            warn!(error = %err, "reload task failed");
            ApiError::reload_failed("failed to reload policy directory").into_response()
        }
    }
}

/// A header's value as a trimmed string; empty when missing or not UTF-8.
fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string()
}
