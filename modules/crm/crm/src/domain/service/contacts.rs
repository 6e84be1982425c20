use std::sync::Arc;

use chrono::Utc;
use crm_db::Db;
use crm_sdk::{Contact, ContactKind, ContactPatch, ListParams, NewContact, UserAccount};
use crm_security::RowId;
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::{debug, info, instrument};

use super::{Deps, ServiceConfig, authorize, check_text, conflict_on_unique};
use crate::domain::error::DomainError;
use crate::domain::permissions::{Action, Resource};
use crate::domain::profile::Actor;
use crate::domain::repos::{ContactRecord, CrmRepository};
use crate::infra::password::hash_password;

const USERNAME_MAX: usize = 150;

/// Sales, support and staff contacts with their user accounts.
///
/// Contacts are not row-filtered; the permission gate alone decides.
pub struct ContactsService<R: CrmRepository> {
    db: Db,
    repo: Arc<R>,
    config: Arc<ServiceConfig>,
}

fn username_conflict(username: &str) -> String {
    format!("a user with username {username} already exists")
}

impl<R: CrmRepository> ContactsService<R> {
    #[must_use]
    pub fn new(deps: Deps<R>) -> Self {
        Self {
            db: deps.db,
            repo: deps.repo,
            config: deps.config,
        }
    }

    fn check_password(&self, password: &str) -> Result<(), DomainError> {
        let min = self.config.min_password_length;
        if password.chars().count() < min {
            return Err(DomainError::validation(
                "password",
                format!("ensure this field has at least {min} characters"),
            ));
        }
        Ok(())
    }

    async fn to_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        record: ContactRecord,
    ) -> Result<Contact, DomainError> {
        let user = self
            .repo
            .find_user(conn, record.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", record.user_id))?;
        let groups = self.repo.group_names(conn, user.id).await?;
        Ok(Contact {
            id: record.id,
            kind,
            user: UserAccount {
                id: user.id,
                username: user.username,
                groups,
            },
        })
    }

    /// # Errors
    /// `Forbidden` without `view_<kind>contact`.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn list(
        &self,
        actor: &Actor,
        kind: ContactKind,
        params: ListParams,
    ) -> Result<Vec<Contact>, DomainError> {
        authorize(actor, Resource::for_contact(kind), Action::List)?;
        let conn = self.db.conn();
        let records = self
            .repo
            .list_contacts(conn, kind, self.config.window(params))
            .await?;
        let mut contacts = Vec::with_capacity(records.len());
        for record in records {
            contacts.push(self.to_contact(conn, kind, record).await?);
        }
        debug!(count = contacts.len(), "Successfully listed contacts");
        Ok(contacts)
    }

    /// # Errors
    /// `NotFound` for an unknown contact.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), contact_id = id))]
    pub async fn get(
        &self,
        actor: &Actor,
        kind: ContactKind,
        id: RowId,
    ) -> Result<Contact, DomainError> {
        authorize(actor, Resource::for_contact(kind), Action::Retrieve)?;
        let conn = self.db.conn();
        let record = self
            .repo
            .get_contact(conn, kind, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contact", id))?;
        self.to_contact(conn, kind, record).await
    }

    /// Create the user, the contact and the group membership in one transaction.
    ///
    /// # Errors
    /// `Validation` for a bad username or short password, `Conflict` for a
    /// taken username.
    #[instrument(skip(self, actor, new_contact), fields(user_id = actor.user_id(), username = %new_contact.username))]
    pub async fn create(
        &self,
        actor: &Actor,
        kind: ContactKind,
        new_contact: &NewContact,
    ) -> Result<Contact, DomainError> {
        authorize(actor, Resource::for_contact(kind), Action::Create)?;
        check_text("username", &new_contact.username, USERNAME_MAX, false)?;
        self.check_password(&new_contact.password)?;

        let txn = self.db.conn().begin().await?;
        if self
            .repo
            .find_user_by_username(&txn, &new_contact.username)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(username_conflict(&new_contact.username)));
        }
        let user = self
            .repo
            .insert_user(
                &txn,
                &new_contact.username,
                &hash_password(&new_contact.password),
                Utc::now(),
            )
            .await
            .map_err(|e| conflict_on_unique(e, || username_conflict(&new_contact.username)))?;
        let record = self.repo.insert_contact(&txn, kind, user.id).await?;
        self.repo
            .add_to_group(&txn, user.id, kind.group_name())
            .await?;
        let contact = self.to_contact(&txn, kind, record).await?;
        txn.commit().await?;

        info!(contact_id = contact.id, ?kind, "Created contact");
        Ok(contact)
    }

    /// Set a new password on the contact's user.
    ///
    /// # Errors
    /// `Validation` when the username names another user or the password is
    /// too short; `NotFound` for an unknown contact.
    #[instrument(skip(self, actor, patch), fields(user_id = actor.user_id(), contact_id = id))]
    pub async fn update(
        &self,
        actor: &Actor,
        kind: ContactKind,
        id: RowId,
        patch: &ContactPatch,
    ) -> Result<Contact, DomainError> {
        authorize(actor, Resource::for_contact(kind), Action::Update)?;
        let conn = self.db.conn();
        let record = self
            .repo
            .get_contact(conn, kind, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contact", id))?;
        let contact = self.to_contact(conn, kind, record).await?;

        if let Some(username) = &patch.username
            && *username != contact.user.username
        {
            return Err(DomainError::validation(
                "username",
                "does not match the contact's user",
            ));
        }
        self.check_password(&patch.password)?;
        self.repo
            .set_password_hash(conn, contact.user.id, &hash_password(&patch.password))
            .await?;

        info!("Changed contact password");
        Ok(contact)
    }

    /// # Errors
    /// `NotFound` for an unknown contact.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), contact_id = id))]
    pub async fn delete(&self, actor: &Actor, kind: ContactKind, id: RowId) -> Result<(), DomainError> {
        authorize(actor, Resource::for_contact(kind), Action::Destroy)?;
        if !self.repo.delete_contact(self.db.conn(), kind, id).await? {
            return Err(DomainError::not_found("Contact", id));
        }
        info!("Deleted contact");
        Ok(())
    }
}
