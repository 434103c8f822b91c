use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use super::dto::{ErrorBody, FieldViolation};

/// The storage call a [`TicketError::Storage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Create,
    FetchAll,
    FetchOne,
    Update,
    MarkUsed,
    Delete,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageOp::Create => "create ticket",
            StorageOp::FetchAll => "fetch tickets",
            StorageOp::FetchOne => "fetch ticket",
            StorageOp::Update => "update ticket",
            StorageOp::MarkUsed => "mark ticket as used",
            StorageOp::Delete => "delete ticket",
        })
    }
}

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("Validation failed (uuid is expected)")]
    InvalidId(String),

    #[error("{0}")]
    MalformedBody(String),

    #[error("Ticket with ID \"{0}\" not found")]
    NotFound(Uuid),

    #[error("Failed to {op}: {message}")]
    Storage { op: StorageOp, message: String },
}

impl TicketError {
    pub fn storage(op: StorageOp, cause: impl fmt::Display) -> Self {
        TicketError::Storage {
            op,
            message: cause.to_string(),
        }
    }

    /// Re-files a storage failure under `op`; the other kinds pass through untouched.
    pub fn within(self, op: StorageOp) -> Self {
        match self {
            e @ TicketError::Storage { .. } => TicketError::storage(op, e),
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TicketError::Validation(_)
            | TicketError::InvalidId(_)
            | TicketError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            TicketError::NotFound(_) => StatusCode::NOT_FOUND,
            TicketError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let status = self.status_code();
        let (message, details) = match self {
            TicketError::Validation(violations) => {
                let messages: Vec<&str> = violations.iter().flat_map(|v| v.messages()).collect();
                (json!(messages), Some(json!(violations)))
            }
            other => (json!(other.to_string()), None),
        };
        ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            details,
        }
    }
}

impl IntoResponse for TicketError {
    fn into_response(self) -> Response {
        match &self {
            TicketError::Storage { op, message } => {
                error!(op = %op, error = %message, "ticket storage failure");
            }
            TicketError::NotFound(id) => warn!(%id, "ticket not found"),
            TicketError::Validation(v) => warn!(violations = v.len(), "ticket validation failed"),
            TicketError::InvalidId(raw) => warn!(id = %raw, "malformed ticket id"),
            TicketError::MalformedBody(reason) => warn!(%reason, "malformed request body"),
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}
