use crm_security::RowId;

/// Errors returned by the CRM public API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrmError {
    /// No valid session backs the request.
    #[error("authentication required")]
    Unauthorized,

    /// The caller's role or permissions do not allow the operation.
    #[error("permission denied")]
    Forbidden,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: RowId },

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl CrmError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: RowId) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
