//! Resolve an authenticated caller into an [`Actor`].

use std::sync::Arc;

use crm_db::Db;
use crm_sdk::ContactKind;
use crm_security::{RowId, SecurityContext};
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::permissions::{Permission, PermissionSet};
use crate::domain::repos::CrmRepository;

/// Role of a caller inside the CRM. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Staff,
    /// Carries the caller's sales contact id.
    Sales(RowId),
    /// Carries the caller's support contact id.
    Support(RowId),
    Anonymous,
}

/// A caller with its role and effective permissions, resolved once per request.
#[derive(Debug, Clone)]
pub struct Actor {
    ctx: SecurityContext,
    role: Role,
    permissions: PermissionSet,
}

impl Actor {
    #[must_use]
    pub fn new(ctx: SecurityContext, role: Role, permissions: PermissionSet) -> Self {
        Self {
            ctx,
            role,
            permissions,
        }
    }

    #[must_use]
    pub fn ctx(&self) -> &SecurityContext {
        &self.ctx
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn user_id(&self) -> RowId {
        self.ctx.subject_id()
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    #[must_use]
    pub fn is_sales(&self) -> bool {
        matches!(self.role, Role::Sales(_))
    }

    #[must_use]
    pub fn is_support(&self) -> bool {
        matches!(self.role, Role::Support(_))
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.role == Role::Anonymous
    }

    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// Looks up the caller's contact records and group permissions.
pub struct ProfileResolver<R: CrmRepository> {
    db: Db,
    repo: Arc<R>,
}

impl<R: CrmRepository> ProfileResolver<R> {
    #[must_use]
    pub fn new(db: Db, repo: Arc<R>) -> Self {
        Self { db, repo }
    }

    /// Resolve `ctx` into an [`Actor`].
    ///
    /// Superusers and owners of a staff contact are staff. Otherwise the
    /// sales contact wins over the support contact.
    ///
    /// # Errors
    /// Returns [`DomainError::Database`] if a lookup fails.
    #[instrument(skip(self, ctx), fields(user_id = ctx.subject_id()))]
    pub async fn resolve(&self, ctx: SecurityContext) -> Result<Actor, DomainError> {
        let conn = self.db.conn();
        let user_id = ctx.subject_id();

        let role = if ctx.is_superuser()
            || self
                .repo
                .find_contact_for_user(conn, ContactKind::Staff, user_id)
                .await?
                .is_some()
        {
            Role::Staff
        } else if let Some(id) = self
            .repo
            .find_contact_for_user(conn, ContactKind::Sales, user_id)
            .await?
        {
            Role::Sales(id)
        } else if let Some(id) = self
            .repo
            .find_contact_for_user(conn, ContactKind::Support, user_id)
            .await?
        {
            Role::Support(id)
        } else {
            Role::Anonymous
        };

        let permissions = if ctx.is_superuser() {
            PermissionSet::all()
        } else {
            PermissionSet::from_codenames(self.repo.permission_codenames(conn, user_id).await?)
        };

        debug!(?role, "resolved actor");
        Ok(Actor::new(ctx, role, permissions))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        let ctx = SecurityContext::builder().subject_id(1).username("u").build();
        Actor::new(ctx, role, PermissionSet::default())
    }

    #[test]
    fn exactly_one_flag_holds() {
        for role in [Role::Staff, Role::Sales(1), Role::Support(1), Role::Anonymous] {
            let a = actor(role);
            let flags = [a.is_staff(), a.is_sales(), a.is_support(), a.is_anonymous()];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{role:?}");
        }
    }

    #[test]
    fn anonymous_holds_no_permissions() {
        let a = actor(Role::Anonymous);
        assert!(!a.has_permission(Permission::ChangeContractStatus));
        assert_eq!(a.user_id(), 1);
    }
}
