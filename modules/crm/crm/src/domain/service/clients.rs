use std::sync::Arc;

use chrono::Utc;
use crm_db::Db;
use crm_sdk::{Client, ClientPatch, ContactKind, ListParams, NewClient};
use crm_security::RowId;
use tracing::{debug, info, instrument};

use super::{Deps, ServiceConfig, authorize, check_text, conflict_on_unique};
use crate::domain::error::DomainError;
use crate::domain::permissions::{Action, Resource};
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;
use crate::domain::visibility::VisibilityPolicy;

pub struct ClientsService<R: CrmRepository> {
    db: Db,
    repo: Arc<R>,
    policy: Arc<VisibilityPolicy<R>>,
    config: Arc<ServiceConfig>,
}

fn validate(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
    mobile: &str,
) -> Result<(), DomainError> {
    check_text("first_name", first_name, 25, false)?;
    check_text("last_name", last_name, 25, false)?;
    check_text("email", email, 100, false)?;
    if !email.contains('@') {
        return Err(DomainError::validation("email", "enter a valid email address"));
    }
    check_text("phone", phone, 20, true)?;
    check_text("mobile", mobile, 20, true)
}

fn email_conflict(email: &str) -> String {
    format!("client with email {email} already exists")
}

impl<R: CrmRepository> ClientsService<R> {
    #[must_use]
    pub fn new(deps: Deps<R>) -> Self {
        Self {
            db: deps.db,
            repo: deps.repo,
            policy: deps.policy,
            config: deps.config,
        }
    }

    /// # Errors
    /// `Forbidden` for callers without `view_client` and for anonymous callers.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn list(&self, actor: &Actor, params: ListParams) -> Result<Vec<Client>, DomainError> {
        debug!("Listing clients");
        authorize(actor, Resource::Client, Action::List)?;
        let conn = self.db.conn();
        let scope = self.policy.client_scope(conn, actor).await?;
        let clients = self
            .repo
            .list_clients(conn, &scope, self.config.window(params))
            .await?;
        debug!(count = clients.len(), "Successfully listed clients");
        Ok(clients)
    }

    /// # Errors
    /// `NotFound` when the client does not exist or lies outside the caller's scope.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), client_id = id))]
    pub async fn get(&self, actor: &Actor, id: RowId) -> Result<Client, DomainError> {
        debug!("Getting client by id");
        authorize(actor, Resource::Client, Action::Retrieve)?;
        let conn = self.db.conn();
        let scope = self.policy.client_scope(conn, actor).await?;
        let client = self
            .repo
            .get_client(conn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Client", id))?;
        debug!("Successfully retrieved client");
        Ok(client)
    }

    /// # Errors
    /// `Validation` for malformed fields, `NotFound` for an unknown sales
    /// contact and `Conflict` for a duplicate email.
    #[instrument(skip(self, actor, new_client), fields(user_id = actor.user_id()))]
    pub async fn create(
        &self,
        actor: &Actor,
        new_client: &NewClient,
    ) -> Result<Client, DomainError> {
        authorize(actor, Resource::Client, Action::Create)?;
        validate(
            &new_client.first_name,
            &new_client.last_name,
            &new_client.email,
            &new_client.phone,
            &new_client.mobile,
        )?;

        let conn = self.db.conn();
        self.repo
            .get_contact(conn, ContactKind::Sales, new_client.sales_contact_id)
            .await?
            .ok_or_else(|| DomainError::not_found("SalesContact", new_client.sales_contact_id))?;
        if self.repo.email_in_use(conn, &new_client.email, None).await? {
            return Err(DomainError::Conflict(email_conflict(&new_client.email)));
        }

        let client = self
            .repo
            .insert_client(conn, new_client, Utc::now())
            .await
            .map_err(|e| conflict_on_unique(e, || email_conflict(&new_client.email)))?;
        info!(client_id = client.id, "Created client");
        Ok(client)
    }

    /// Apply `patch` to a visible client.
    ///
    /// # Errors
    /// As for [`Self::create`], plus `NotFound` for a client outside the scope.
    #[instrument(skip(self, actor, patch), fields(user_id = actor.user_id(), client_id = id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: RowId,
        patch: ClientPatch,
    ) -> Result<Client, DomainError> {
        authorize(actor, Resource::Client, Action::Update)?;
        let conn = self.db.conn();
        let scope = self.policy.client_scope(conn, actor).await?;
        let mut client = self
            .repo
            .get_client(conn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Client", id))?;

        if let Some(v) = patch.first_name {
            client.first_name = v;
        }
        if let Some(v) = patch.last_name {
            client.last_name = v;
        }
        if let Some(v) = patch.phone {
            client.phone = v;
        }
        if let Some(v) = patch.mobile {
            client.mobile = v;
        }
        if let Some(sales_contact_id) = patch.sales_contact_id {
            self.repo
                .get_contact(conn, ContactKind::Sales, sales_contact_id)
                .await?
                .ok_or_else(|| DomainError::not_found("SalesContact", sales_contact_id))?;
            client.sales_contact_id = sales_contact_id;
        }
        if let Some(email) = patch.email {
            if self.repo.email_in_use(conn, &email, Some(id)).await? {
                return Err(DomainError::Conflict(email_conflict(&email)));
            }
            client.email = email;
        }
        validate(
            &client.first_name,
            &client.last_name,
            &client.email,
            &client.phone,
            &client.mobile,
        )?;

        client.date_updated = Utc::now();
        let client = self
            .repo
            .update_client(conn, &client)
            .await
            .map_err(|e| conflict_on_unique(e, || email_conflict(&client.email)))?;
        info!("Updated client");
        Ok(client)
    }

    /// Delete a visible client together with its contracts and events.
    ///
    /// # Errors
    /// `NotFound` for a client outside the scope.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), client_id = id))]
    pub async fn delete(&self, actor: &Actor, id: RowId) -> Result<(), DomainError> {
        authorize(actor, Resource::Client, Action::Destroy)?;
        let conn = self.db.conn();
        let scope = self.policy.client_scope(conn, actor).await?;
        if !self.repo.delete_client(conn, &scope, id).await? {
            return Err(DomainError::not_found("Client", id));
        }
        info!("Deleted client");
        Ok(())
    }
}
