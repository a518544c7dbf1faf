use std::sync::Arc;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::badge;
use crate::config::Config;
use crate::metrics;
use crate::pilot::snapshot::Snapshot;
use crate::score::engine::{Evidence, ScoreResult};
use crate::verifier::TrustVerifier;
use crate::web::error::ApiError;

/// HTTP API - trust scores, badges and the pilot cohort
pub struct WebServer {
    verifier: Arc<TrustVerifier>,
    config: Arc<Config>,
}

#[derive(Clone)]
struct AppState {
    verifier: Arc<TrustVerifier>,
}

#[derive(Deserialize)]
struct TrustScoreRequest {
    agent_id: String,
    #[serde(default)]
    evidence: Evidence,
}

impl WebServer {
    pub fn new(verifier: Arc<TrustVerifier>, config: Arc<Config>) -> Self {
        Self { verifier, config }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        if !self.config.web.enabled {
            info!("Web API disabled");
            return Ok(());
        }

        let app = router(self.verifier.clone());

        let addr = format!("{}:{}", self.config.web.address, self.config.web.port);
        info!("🌐 API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

pub fn router(verifier: Arc<TrustVerifier>) -> Router {
    let cors = verifier.config.web.cors_permissive;
    let state = AppState { verifier };

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(api_metrics))
        .route("/api/trust-score", post(post_trust_score))
        .route("/api/trust-score/:identifier", get(get_trust_score))
        .route("/badge/:identifier", get(badge_svg))
        .route("/pilot/ingest", post(pilot_ingest))
        .route("/pilot/score/:agent_id", get(pilot_score))
        .route("/pilot/cohort", get(pilot_cohort))
        .route("/pilot/snapshot/:agent_id/:date", get(pilot_snapshot))
        .with_state(state);

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Rejects blank identifiers. Others pass through untouched.
fn require_identifier(identifier: &str) -> Result<&str, ApiError> {
    if identifier.trim().is_empty() {
        Err(ApiError::InvalidIdentifier)
    } else {
        Ok(identifier)
    }
}

/// Service info
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "trust-verifier",
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Trust score verification and pilot cohort tracking for autonomous agents",
        "timestamp": Utc::now(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.verifier.get_health())
}

/// Prometheus metrics
async fn api_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(&state.verifier),
    )
}

/// Trust score with evidence from the query string
async fn get_trust_score(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(evidence): Query<Evidence>,
) -> Result<Json<ScoreResult>, ApiError> {
    let identifier = require_identifier(&identifier)?;
    Ok(Json(state.verifier.scorer.score(identifier, &evidence).await))
}

async fn post_trust_score(
    State(state): State<AppState>,
    Json(request): Json<TrustScoreRequest>,
) -> Result<Json<ScoreResult>, ApiError> {
    let identifier = require_identifier(&request.agent_id)?;
    Ok(Json(state.verifier.scorer.score(identifier, &request.evidence).await))
}

/// SVG badge; a trailing `.svg` on the identifier is ignored
async fn badge_svg(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let identifier = identifier.strip_suffix(".svg").unwrap_or(&identifier);
    let identifier = require_identifier(identifier)?;

    let result = state.verifier.scorer.score(identifier, &Evidence::default()).await;
    state.verifier.metrics.record_badge();

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "max-age=3600"),
        ],
        badge::render_badge(result.grade, result.score),
    ))
}

async fn pilot_ingest(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .verifier
        .pilot
        .ingest(&snapshot)
        .await
        .map_err(ApiError::from_ingest)?;
    Ok(Json(receipt))
}

async fn pilot_score(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.verifier.pilot.score(&agent_id).await?))
}

async fn pilot_cohort(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.verifier.pilot.cohort_status().await?))
}

async fn pilot_snapshot(
    State(state): State<AppState>,
    Path((agent_id, date)): Path<(String, NaiveDate)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.verifier.pilot.snapshot(&agent_id, date).await?))
}
