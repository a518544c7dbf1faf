use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::pilot::error::{PilotError, StoreError};

/// Errors surfaced by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("agent_id must be a non-empty string")]
    InvalidIdentifier,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Pilot(#[from] PilotError),
}

impl ApiError {
    /// Ingestion treats a non-member as a malformed submission, not a missing resource
    pub fn from_ingest(err: PilotError) -> Self {
        match err {
            PilotError::NotInCohort(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Pilot(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pilot(PilotError::NotInCohort(_))
            | ApiError::Pilot(PilotError::NoData(_))
            | ApiError::Pilot(PilotError::SnapshotNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Pilot(PilotError::Store(StoreError::AlreadyExists { .. })) => StatusCode::CONFLICT,
            ApiError::Pilot(PilotError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidIdentifier => "invalid_identifier",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Pilot(PilotError::NotInCohort(_)) => "not_in_cohort",
            ApiError::Pilot(PilotError::NoData(_)) => "no_data",
            ApiError::Pilot(PilotError::SnapshotNotFound { .. }) => "snapshot_not_found",
            ApiError::Pilot(PilotError::Store(StoreError::AlreadyExists { .. })) => "already_exists",
            ApiError::Pilot(PilotError::Store(_)) => "storage_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = serde_json::json!({
            "error": self.kind(),
            "detail": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
