//! Webhook HTTP server
//!
//! `POST /github/webhook` verifies the delivery signature, decodes the event
//! once and hands actionable pull requests to the decision engine. Each
//! delivery runs on its own task; the only shared state is the read-only
//! engine and secret.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::engine::CheckDecisionEngine;
use crate::error::CheckError;
use crate::event::WebhookEvent;
use crate::store::CheckRunStore;

pub const WEBHOOK_PATH: &str = "/github/webhook";
pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// GitHub caps webhook payloads at 25 MiB
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState<S> {
    pub engine: Arc<CheckDecisionEngine<S>>,
    pub webhook_secret: Option<Arc<[u8]>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            webhook_secret: self.webhook_secret.clone(),
        }
    }
}

impl<S: CheckRunStore> AppState<S> {
    pub fn new(engine: CheckDecisionEngine<S>, webhook_secret: Option<Vec<u8>>) -> Self {
        Self {
            engine: Arc::new(engine),
            webhook_secret: webhook_secret.map(Arc::from),
        }
    }
}

pub fn router<S: CheckRunStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route(
            WEBHOOK_PATH,
            post(handle_webhook::<S>).layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES)),
        )
        .route("/healthz", get(health_check))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("branch-check listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "branch-check",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn handle_webhook<S: CheckRunStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery = header_str(&headers, DELIVERY_HEADER).unwrap_or("unknown");

    if let Some(secret) = &state.webhook_secret {
        let valid = header_str(&headers, SIGNATURE_HEADER)
            .map(|signature| verify_signature(secret, &body, signature))
            .unwrap_or(false);
        if !valid {
            warn!(delivery = %delivery, "Webhook signature verification failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "invalid webhook signature" })),
            )
                .into_response();
        }
    }

    match process(&state, &headers, &body).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "message": "ok" }))).into_response(),
        Err(err) => {
            error!(delivery = %delivery, error = %err, "failed to create check");
            err.into_response()
        }
    }
}

async fn process<S: CheckRunStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), CheckError> {
    let event_type = header_str(headers, EVENT_HEADER)
        .ok_or_else(|| CheckError::malformed(format!("missing {} header", EVENT_HEADER)))?;

    let event = WebhookEvent::decode(event_type, body)?;

    let Some(request) = event.normalize()? else {
        if let WebhookEvent::Other { event, action } = &event {
            info!(event = %event, action = ?action, "Ignoring non-actionable event");
        }
        return Ok(());
    };

    state.engine.evaluate(&request).await?;
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Check a `sha256=<hex>` signature against the HMAC-SHA256 of `body`
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };

    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
