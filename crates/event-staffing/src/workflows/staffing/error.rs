use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::domain::{DecisionStatus, ScheduledAssignment, StockKey};
use super::repository::RepositoryError;

/// Error surfaced by every staffing operation.
#[derive(Debug, thiserror::Error)]
pub enum StaffingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Conflict(#[from] ConflictReason),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a request collided with current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictReason {
    #[error("host already applied to this event")]
    DuplicateApplication,
    #[error("event is not open for applications (status {status})")]
    EventNotOpen { status: DecisionStatus },
    #[error("already processed")]
    AlreadyProcessed,
    #[error("schedule overlaps {} accepted assignment(s)", .overlapping.len())]
    ScheduleOverlap { overlapping: Vec<ScheduledAssignment> },
    #[error("insufficient stock for {key}")]
    InsufficientStock { key: StockKey },
    #[error("event still has applications")]
    EventHasDependents,
}

impl StaffingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            StaffingError::Validation(_) => "validation",
            StaffingError::NotFound(_) => "not_found",
            StaffingError::Conflict(_) => "conflict",
            StaffingError::Forbidden(_) => "forbidden",
            StaffingError::Internal(_) => "internal",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            StaffingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StaffingError::NotFound(_) => StatusCode::NOT_FOUND,
            StaffingError::Conflict(_) => StatusCode::CONFLICT,
            StaffingError::Forbidden(_) => StatusCode::FORBIDDEN,
            StaffingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Call sites that expect `Conflict` or `NotFound` from a write match on them first; reaching
/// this conversion with either means the store broke its contract.
impl From<RepositoryError> for StaffingError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => {
                Self::Internal("unexpected storage conflict".to_string())
            }
            RepositoryError::NotFound => {
                Self::Internal("record vanished during the operation".to_string())
            }
            RepositoryError::Unavailable(reason) => Self::Internal(reason),
        }
    }
}

impl IntoResponse for StaffingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut payload = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });

        if let StaffingError::Conflict(ConflictReason::ScheduleOverlap { overlapping }) = &self {
            payload["conflicts"] = json!(overlapping);
        }

        (status, Json(payload)).into_response()
    }
}
