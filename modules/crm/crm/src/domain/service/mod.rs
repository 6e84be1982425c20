//! Domain services. Every operation takes the caller's [`Actor`], checks the
//! permission gate, narrows by the visibility scope and only then touches
//! storage.

mod auth;
mod clients;
mod contacts;
mod contracts;
mod events;

use std::sync::Arc;

use crm_db::Db;
use crm_db::secure::Window;
use crm_sdk::ListParams;
use sea_orm::{DbErr, SqlErr};

pub use auth::{AuthService, LoginSession};
pub use clients::ClientsService;
pub use contacts::ContactsService;
pub use contracts::ContractsService;
pub use events::EventsService;

use crate::domain::error::DomainError;
use crate::domain::permissions::{self, Action, GateDecision, Resource};
use crate::domain::profile::{Actor, ProfileResolver};
use crate::domain::repos::CrmRepository;
use crate::domain::visibility::VisibilityPolicy;

/// Tunables shared by all services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub session_ttl: chrono::Duration,
    pub min_password_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
            session_ttl: chrono::Duration::days(1),
            min_password_length: 8,
        }
    }
}

impl ServiceConfig {
    /// Resolve list parameters; `limit` is capped at `max_page_size`.
    #[must_use]
    pub fn window(&self, params: ListParams) -> Window {
        Window {
            limit: params
                .limit
                .unwrap_or(self.default_page_size)
                .min(self.max_page_size),
            offset: params.offset.unwrap_or(0),
        }
    }
}

/// Route-level gate as seen by a service. `Deny` becomes `Forbidden`.
///
/// # Errors
/// [`DomainError::Forbidden`] when the actor lacks the permission.
pub fn authorize(
    actor: &Actor,
    resource: Resource,
    action: Action,
) -> Result<GateDecision, DomainError> {
    let decision = permissions::check(actor, resource, action);
    if decision == GateDecision::Deny {
        return Err(DomainError::Forbidden);
    }
    Ok(decision)
}

/// Turn a unique constraint violation into a conflict; anything else stays a database error.
#[must_use]
pub fn conflict_on_unique(e: DbErr, message: impl FnOnce() -> String) -> DomainError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        DomainError::Conflict(message())
    } else {
        DomainError::Database(e)
    }
}

/// Ensure `value` is at most `max` characters long, and not blank unless `blank` is allowed.
///
/// # Errors
/// [`DomainError::Validation`] naming `field`.
pub fn check_text(field: &str, value: &str, max: usize, blank: bool) -> Result<(), DomainError> {
    if !blank && value.trim().is_empty() {
        return Err(DomainError::validation(field, "this field may not be blank"));
    }
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("ensure this field has no more than {max} characters"),
        ));
    }
    Ok(())
}

/// DI container holding every service.
pub struct AppServices<R: CrmRepository> {
    pub profiles: Arc<ProfileResolver<R>>,
    pub auth: AuthService<R>,
    pub contacts: ContactsService<R>,
    pub clients: ClientsService<R>,
    pub contracts: ContractsService<R>,
    pub events: EventsService<R>,
}

impl<R: CrmRepository> AppServices<R> {
    #[must_use]
    pub fn new(db: &Db, repo: &Arc<R>, config: ServiceConfig) -> Self {
        let config = Arc::new(config);
        let profiles = Arc::new(ProfileResolver::new(db.clone(), Arc::clone(repo)));
        let policy = Arc::new(VisibilityPolicy::new(Arc::clone(repo)));
        let deps = || Deps {
            db: db.clone(),
            repo: Arc::clone(repo),
            policy: Arc::clone(&policy),
            config: Arc::clone(&config),
        };
        Self {
            auth: AuthService::new(deps(), Arc::clone(&profiles)),
            contacts: ContactsService::new(deps()),
            clients: ClientsService::new(deps()),
            contracts: ContractsService::new(deps()),
            events: EventsService::new(deps()),
            profiles,
        }
    }
}

/// What every service holds.
pub struct Deps<R: CrmRepository> {
    pub db: Db,
    pub repo: Arc<R>,
    pub policy: Arc<VisibilityPolicy<R>>,
    pub config: Arc<ServiceConfig>,
}
