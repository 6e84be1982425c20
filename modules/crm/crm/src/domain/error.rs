use crm_sdk::CrmError;
use crm_security::RowId;
use sea_orm::DbErr;

/// Crate-internal error for every CRM operation.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied")]
    Forbidden,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: RowId },

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl DomainError {
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

    #[must_use]
    pub fn missing(field: &str) -> Self {
        Self::validation(field, "this field is required")
    }
}

impl From<DomainError> for CrmError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Unauthorized => Self::Unauthorized,
            DomainError::Forbidden => Self::Forbidden,
            DomainError::NotFound { entity, id } => Self::NotFound { entity, id },
            DomainError::Validation { field, message } => Self::Validation { field, message },
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Database(_) => Self::Internal,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn database_errors_do_not_leak_to_sdk() {
        let err: CrmError = DomainError::Database(DbErr::Custom("disk I/O".to_owned())).into();
        assert_eq!(err, CrmError::Internal);
    }

    #[test]
    fn not_found_keeps_entity_and_id() {
        let err: CrmError = DomainError::not_found("Client", 7).into();
        assert_eq!(err, CrmError::not_found("Client", 7));
    }
}
