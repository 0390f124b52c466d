//! Gateway HTTP server: fulfillment webhook and health probe.

use crate::config::{self, Config};
use crate::credential::AgentCredential;
use crate::dialogflow::{DialogflowSessionClient, ServiceAccountTokenSource};
use crate::fulfillment::{self, Orchestrator, WebhookRequest};
use crate::gateway::auth;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// When Some, the webhook requires `Authorization: Bearer <token>` matching this.
    pub required_token: Option<SecretString>,
    pub orchestrator: Orchestrator,
}

/// Build the counselor session client from config: load the service-account credential and
/// bind the client to the configured session.
pub fn counselor_client(config: &Config, config_path: &Path) -> Result<DialogflowSessionClient> {
    let path = config::resolve_credentials_path(config, config_path).context(
        "no counselor credentials configured (set counselor.credentialsPath or COUNSELOR_CREDENTIALS_PATH)",
    )?;
    let credential = AgentCredential::load(&path)?;
    if let Some(project) = credential.project_id() {
        if project != config.counselor.project_id.trim() {
            log::warn!(
                "counselor credential belongs to project {} but session is in {}",
                project,
                config.counselor.project_id
            );
        }
    }
    log::info!("counselor credential loaded for {}", credential.client_email());
    let http = DialogflowSessionClient::http_client(config.counselor.timeout())
        .context("building counselor http client")?;
    let tokens = Arc::new(ServiceAccountTokenSource::new(credential, http.clone()));
    Ok(DialogflowSessionClient::new(
        config.counselor.endpoint.clone(),
        config.counselor.session_path(),
        tokens,
        http,
    ))
}

/// Run the gateway: build the counselor client and dispatch table from config, then serve.
/// `config_path` is used to resolve a relative credentials path.
pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    let client = counselor_client(&config, &config_path)?;
    let table = fulfillment::build_dispatch_table(&config, Arc::new(client))?;
    serve_gateway(config, Orchestrator::new(table)).await
}

/// Serve the webhook with an already-built orchestrator; binds to config.gateway.bind:config.gateway.port.
/// When bind is not loopback, webhook token auth must be configured or startup fails.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn serve_gateway(config: Config, orchestrator: Orchestrator) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    let required_token = config::require_webhook_token(&config);
    if !config::is_loopback_bind(&bind) && required_token.is_none() {
        anyhow::bail!(
            "refusing to bind gateway to {} without auth (set gateway.auth.mode to \"token\" and gateway.auth.token or RELAY_WEBHOOK_TOKEN)",
            bind
        );
    }

    log::info!(
        "relaying to counselor session {} (intent {}, language {})",
        config.counselor.session_path(),
        config.counselor.intent,
        config.counselor.language_code
    );
    log::info!(
        "registered intents: {}",
        orchestrator.table().intents().join(", ")
    );

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let state = GatewayState {
        config: Arc::new(config),
        required_token,
        orchestrator,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Routes: `GET /` health, `POST {webhookPath}` fulfillment.
pub fn router(state: GatewayState) -> Router {
    let path = state.config.gateway.webhook_path.trim();
    let webhook_path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    Router::new()
        .route("/", get(health_http))
        .route(&webhook_path, post(webhook))
        .with_state(state)
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /webhook. Verifies the optional bearer token, then fulfills. A well-formed request
/// always gets 200 with a JSON body, whatever happened to the relay.
async fn webhook(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(ref expected) = state.required_token {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(auth::extract_bearer_token)
            .unwrap_or("");
        if !auth::validate_token(expected, provided) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    let request: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("webhook: invalid request body: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    Json(state.orchestrator.respond(&request).await).into_response()
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "session": state.config.counselor.session_path().to_string(),
        "intents": state.orchestrator.table().intents(),
    }))
}
