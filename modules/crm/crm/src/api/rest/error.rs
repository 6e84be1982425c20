//! Mapping of [`DomainError`] to HTTP problem responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::error::DomainError;

/// Error body: `{"status", "title", "detail"}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Problem {
    pub status: u16,
    pub title: String,
    pub detail: String,
}

impl Problem {
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_owned(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<&DomainError> for Problem {
    fn from(e: &DomainError) -> Self {
        match e {
            DomainError::Unauthorized => Self::new(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided or are invalid.",
            ),
            DomainError::Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action.",
            ),
            DomainError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            DomainError::Validation { .. } => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            DomainError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg.clone()),
            DomainError::Database(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred.",
            ),
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        if let Self::Database(db) = &self {
            tracing::error!(error = %db, "request failed on database error");
        }
        Problem::from(&self).into_response()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use sea_orm::DbErr;
    use tracing_test::traced_test;

    #[test]
    fn status_per_kind() {
        let cases = [
            (DomainError::Unauthorized, 401),
            (DomainError::Forbidden, 403),
            (DomainError::not_found("Client", 3), 404),
            (DomainError::missing("email"), 400),
            (DomainError::Conflict("dup".to_owned()), 409),
            (DomainError::Database(DbErr::Custom("boom".to_owned())), 500),
        ];
        for (err, status) in cases {
            assert_eq!(Problem::from(&err).status, status, "{err}");
            assert_eq!(err.into_response().status().as_u16(), status);
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let problem = Problem::from(&DomainError::Database(DbErr::Custom(
            "no such table: clients".to_owned(),
        )));
        assert!(!problem.detail.contains("clients"));
        assert_eq!(problem.title, "Internal Server Error");
    }

    #[test]
    fn not_found_names_the_entity() {
        let problem = Problem::from(&DomainError::not_found("Contract", 9));
        assert_eq!(problem.detail, "Contract 9 not found");
        assert_eq!(problem.title, "Not Found");
    }

    #[test]
    #[traced_test]
    fn database_errors_are_logged_not_returned() {
        let response =
            DomainError::Database(DbErr::Custom("disk I/O error".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(logs_contain("request failed on database error"));
        assert!(logs_contain("disk I/O error"));
    }
}
