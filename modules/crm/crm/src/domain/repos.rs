//! Storage seams used by the services.
//!
//! Every read of a client, contract or event takes the caller's
//! [`AccessScope`]; rows outside it are never returned, updated or deleted.
//! Connections are passed per call so that services can run several
//! repository calls in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_db::secure::{AccessScope, Window};
use crm_sdk::{
    Client, ContactKind, Contract, Event, EventStatus, NewClient, NewContract, StatusSelector,
};
use crm_security::RowId;
use sea_orm::{ConnectionTrait, DbErr};

/// Stored user row, including the password hash. Never leaves the crate.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: RowId,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("is_superuser", &self.is_superuser)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// A row of one of the three contact tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: RowId,
    pub user_id: RowId,
}

/// Event row as written; the status is already resolved to an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub client_id: RowId,
    pub support_contact_id: RowId,
    pub event_status_id: RowId,
    pub attendees: i32,
    pub event_date: DateTime<Utc>,
    pub notes: String,
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: RowId,
    ) -> Result<Option<UserRecord>, DbErr>;

    async fn find_user_by_username<C: ConnectionTrait>(
        &self,
        conn: &C,
        username: &str,
    ) -> Result<Option<UserRecord>, DbErr>;

    async fn insert_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        username: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DbErr>;

    async fn set_password_hash<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
        password_hash: &str,
    ) -> Result<(), DbErr>;

    /// Names of the user's groups, sorted.
    async fn group_names<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
    ) -> Result<Vec<String>, DbErr>;

    /// Codenames granted to the user through any of its groups.
    async fn permission_codenames<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
    ) -> Result<Vec<String>, DbErr>;

    /// Add the user to an existing group. Already being a member is fine.
    async fn add_to_group<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
        group_name: &str,
    ) -> Result<(), DbErr>;

    async fn insert_session<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
        token_hash: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbErr>;

    /// Owner of an unexpired session.
    async fn find_session_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, DbErr>;

    async fn delete_session<C: ConnectionTrait>(
        &self,
        conn: &C,
        token_hash: &str,
    ) -> Result<bool, DbErr>;
}

#[async_trait]
pub trait ContactsRepository: Send + Sync {
    /// Id of the `kind` contact owned by `user_id`, if any.
    async fn find_contact_for_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        user_id: RowId,
    ) -> Result<Option<RowId>, DbErr>;

    async fn list_contacts<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        window: Window,
    ) -> Result<Vec<ContactRecord>, DbErr>;

    async fn get_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        id: RowId,
    ) -> Result<Option<ContactRecord>, DbErr>;

    async fn insert_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        user_id: RowId,
    ) -> Result<ContactRecord, DbErr>;

    async fn delete_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        id: RowId,
    ) -> Result<bool, DbErr>;
}

#[async_trait]
pub trait ClientsRepository: Send + Sync {
    async fn list_clients<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        window: Window,
    ) -> Result<Vec<Client>, DbErr>;

    async fn get_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<Option<Client>, DbErr>;

    async fn insert_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        new_client: &NewClient,
        now: DateTime<Utc>,
    ) -> Result<Client, DbErr>;

    /// Write every mutable column of `client`.
    async fn update_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        client: &Client,
    ) -> Result<Client, DbErr>;

    async fn delete_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<bool, DbErr>;

    /// Whether another client already uses `email`.
    async fn email_in_use<C: ConnectionTrait>(
        &self,
        conn: &C,
        email: &str,
        except: Option<RowId>,
    ) -> Result<bool, DbErr>;

    async fn client_ids_owned_by<C: ConnectionTrait>(
        &self,
        conn: &C,
        sales_contact_id: RowId,
    ) -> Result<Vec<RowId>, DbErr>;
}

#[async_trait]
pub trait ContractsRepository: Send + Sync {
    async fn list_contracts<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        window: Window,
    ) -> Result<Vec<Contract>, DbErr>;

    async fn get_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<Option<Contract>, DbErr>;

    /// A missing `payment_due` defaults to `now`.
    async fn insert_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        new_contract: &NewContract,
        now: DateTime<Utc>,
    ) -> Result<Contract, DbErr>;

    async fn update_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        contract: &Contract,
    ) -> Result<Contract, DbErr>;

    async fn delete_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<bool, DbErr>;

    /// Clients referenced by contracts tracked by `sales_contact_id`.
    async fn client_ids_under_contract_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        sales_contact_id: RowId,
    ) -> Result<Vec<RowId>, DbErr>;
}

#[async_trait]
pub trait EventsRepository: Send + Sync {
    async fn list_events<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        window: Window,
    ) -> Result<Vec<Event>, DbErr>;

    async fn get_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<Option<Event>, DbErr>;

    async fn insert_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        draft: &EventDraft,
        now: DateTime<Utc>,
    ) -> Result<Event, DbErr>;

    async fn update_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: RowId,
        draft: &EventDraft,
        now: DateTime<Utc>,
    ) -> Result<Event, DbErr>;

    async fn delete_event<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<bool, DbErr>;

    /// Clients that have at least one event assigned to `support_contact_id`.
    async fn client_ids_with_events_for<C: ConnectionTrait>(
        &self,
        conn: &C,
        support_contact_id: RowId,
    ) -> Result<Vec<RowId>, DbErr>;

    async fn list_statuses<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<EventStatus>, DbErr>;

    async fn find_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        selector: StatusSelector,
    ) -> Result<Option<EventStatus>, DbErr>;
}

/// Everything the services need from storage.
pub trait CrmRepository:
    UsersRepository
    + ContactsRepository
    + ClientsRepository
    + ContractsRepository
    + EventsRepository
    + 'static
{
}

impl<T> CrmRepository for T where
    T: UsersRepository
        + ContactsRepository
        + ClientsRepository
        + ContractsRepository
        + EventsRepository
        + 'static
{
}
