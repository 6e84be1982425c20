//! Row-level visibility per resource type.
//!
//! Each filter turns an [`Actor`] into the [`AccessScope`] of rows it may
//! see, or refuses outright with [`DomainError::Forbidden`]. The sales
//! clauses are transitive: a sales contact also sees contracts
//! on its own clients and events on clients it holds a contract with.

use std::sync::Arc;

use crm_db::secure::AccessScope;
use crm_security::{ScopeFilter, properties};
use sea_orm::ConnectionTrait;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::profile::{Actor, Role};
use crate::domain::repos::CrmRepository;

pub struct VisibilityPolicy<R: CrmRepository> {
    repo: Arc<R>,
}

impl<R: CrmRepository> VisibilityPolicy<R> {
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Staff: all. Sales: own clients. Support: clients of own events.
    ///
    /// # Errors
    /// [`DomainError::Forbidden`] for anonymous callers.
    #[instrument(skip_all, fields(role = ?actor.role()))]
    pub async fn client_scope<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Actor,
    ) -> Result<AccessScope, DomainError> {
        let scope = match actor.role() {
            Role::Anonymous => return Err(DomainError::Forbidden),
            Role::Staff => AccessScope::allow_all(),
            Role::Sales(id) => {
                AccessScope::any_of(vec![vec![ScopeFilter::equals(properties::SALES_CONTACT_ID, id)]])
            }
            Role::Support(id) => {
                let client_ids = self.repo.client_ids_with_events_for(conn, id).await?;
                AccessScope::any_of(vec![vec![ScopeFilter::in_list(properties::ID, client_ids)]])
            }
        };
        debug!(constraints = scope.constraints().len(), "client scope");
        Ok(scope)
    }

    /// Staff: all. Sales: contracts it tracks or on clients it owns.
    ///
    /// # Errors
    /// [`DomainError::Forbidden`] for support and anonymous callers.
    #[instrument(skip_all, fields(role = ?actor.role()))]
    pub async fn contract_scope<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Actor,
    ) -> Result<AccessScope, DomainError> {
        let scope = match actor.role() {
            Role::Staff => AccessScope::allow_all(),
            Role::Sales(id) => {
                let owned = self.repo.client_ids_owned_by(conn, id).await?;
                AccessScope::any_of(vec![
                    vec![ScopeFilter::equals(properties::SALES_CONTACT_ID, id)],
                    vec![ScopeFilter::in_list(properties::CLIENT_ID, owned)],
                ])
            }
            Role::Support(_) | Role::Anonymous => return Err(DomainError::Forbidden),
        };
        debug!(constraints = scope.constraints().len(), "contract scope");
        Ok(scope)
    }

    /// Staff: all. Sales: events on clients it owns or holds a contract
    /// with. Support: events assigned to it.
    ///
    /// # Errors
    /// [`DomainError::Forbidden`] for anonymous callers.
    #[instrument(skip_all, fields(role = ?actor.role()))]
    pub async fn event_scope<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &Actor,
    ) -> Result<AccessScope, DomainError> {
        let scope = match actor.role() {
            Role::Anonymous => return Err(DomainError::Forbidden),
            Role::Staff => AccessScope::allow_all(),
            Role::Sales(id) => {
                let owned = self.repo.client_ids_owned_by(conn, id).await?;
                let contracted = self.repo.client_ids_under_contract_with(conn, id).await?;
                AccessScope::any_of(vec![
                    vec![ScopeFilter::in_list(properties::CLIENT_ID, owned)],
                    vec![ScopeFilter::in_list(properties::CLIENT_ID, contracted)],
                ])
            }
            Role::Support(id) => AccessScope::any_of(vec![vec![ScopeFilter::equals(
                properties::SUPPORT_CONTACT_ID,
                id,
            )]]),
        };
        debug!(constraints = scope.constraints().len(), "event scope");
        Ok(scope)
    }
}
