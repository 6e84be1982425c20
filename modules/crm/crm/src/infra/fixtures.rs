//! Database administration: wipe, seed groups and permissions, load fixtures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crm_db::Db;
use crm_sdk::{ContactKind, EventStatusCode};
use crm_security::RowId;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domain::permissions::{Permission, group_grants};
use crate::domain::repos::UsersRepository;
use crate::infra::password::hash_password;
use crate::infra::storage::OrmCrmRepository;
use crate::infra::storage::entity::{
    client, contract, event, event_status, group, group_permission, permission, sales_contact,
    session, staff_contact, support_contact, user, user_group,
};

/// Errors raised while reading a fixture file.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported fixture format {0:?}; expected .yaml, .yml or .json")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserFixture {
    pub id: RowId,
    pub username: String,
    /// Plain text; hashed at load time.
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactFixture {
    pub id: RowId,
    pub user_id: RowId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientFixture {
    pub id: RowId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub mobile: String,
    pub sales_contact_id: RowId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractFixture {
    pub id: RowId,
    pub sales_contact_id: RowId,
    pub client_id: RowId,
    #[serde(default)]
    pub status: bool,
    pub amount: Decimal,
    pub payment_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFixture {
    pub id: RowId,
    pub client_id: RowId,
    pub support_contact_id: RowId,
    #[serde(default = "default_status_id")]
    pub event_status_id: RowId,
    #[serde(default)]
    pub attendees: i32,
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

fn default_status_id() -> RowId {
    1
}

/// A complete dataset, loaded with explicit ids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureSet {
    pub users: Vec<UserFixture>,
    pub sales_contacts: Vec<ContactFixture>,
    pub support_contacts: Vec<ContactFixture>,
    pub staff_contacts: Vec<ContactFixture>,
    pub clients: Vec<ClientFixture>,
    pub contracts: Vec<ContractFixture>,
    pub events: Vec<EventFixture>,
}

impl FixtureSet {
    /// Parse a YAML (`.yaml`, `.yml`) or JSON (`.json`) fixture file.
    ///
    /// # Errors
    /// [`FixtureError`] when the file cannot be read, has another extension
    /// or does not parse.
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, String> = match ext.as_deref() {
            Some("yaml" | "yml") => |s| serde_saphyr::from_str(s).map_err(|e| e.to_string()),
            Some("json") => |s| serde_json::from_str(s).map_err(|e| e.to_string()),
            _ => return Err(FixtureError::UnsupportedFormat(path.to_path_buf())),
        };
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&raw).map_err(|message| FixtureError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn contacts(&self) -> impl Iterator<Item = (ContactKind, ContactFixture)> + '_ {
        let tag = |kind| move |c: &ContactFixture| (kind, *c);
        self.staff_contacts
            .iter()
            .map(tag(ContactKind::Staff))
            .chain(self.sales_contacts.iter().map(tag(ContactKind::Sales)))
            .chain(self.support_contacts.iter().map(tag(ContactKind::Support)))
    }
}

/// Delete every CRM row, then sessions, users, groups and the custom
/// `change_contract_status` permission. Event statuses stay.
///
/// # Errors
/// Returns the driver error; the wipe is transactional.
#[instrument(skip_all)]
pub async fn initialize(db: &Db) -> Result<(), DbErr> {
    let txn = db.conn().begin().await?;
    event::Entity::delete_many().exec(&txn).await?;
    contract::Entity::delete_many().exec(&txn).await?;
    client::Entity::delete_many().exec(&txn).await?;
    sales_contact::Entity::delete_many().exec(&txn).await?;
    support_contact::Entity::delete_many().exec(&txn).await?;
    staff_contact::Entity::delete_many().exec(&txn).await?;
    session::Entity::delete_many().exec(&txn).await?;
    user_group::Entity::delete_many().exec(&txn).await?;
    group_permission::Entity::delete_many().exec(&txn).await?;
    user::Entity::delete_many().exec(&txn).await?;
    group::Entity::delete_many().exec(&txn).await?;
    permission::Entity::delete_many()
        .filter(permission::Column::Codename.eq(Permission::ChangeContractStatus.codename()))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    info!("Database wiped");
    Ok(())
}

async fn ensure_permission<C: ConnectionTrait>(conn: &C, p: Permission) -> Result<i64, DbErr> {
    let codename = p.codename();
    if let Some(existing) = permission::Entity::find()
        .filter(permission::Column::Codename.eq(codename.as_str()))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }
    let created = permission::ActiveModel {
        codename: Set(codename),
        name: Set(p.display_name()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(created.id)
}

async fn ensure_group<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i64, DbErr> {
    if let Some(existing) = group::Entity::find()
        .filter(group::Column::Name.eq(name))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }
    let created = group::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(created.id)
}

async fn ensure_statuses<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    for (id, status) in (1..).zip(EventStatusCode::ALL) {
        let exists = event_status::Entity::find()
            .filter(event_status::Column::Status.eq(status.code()))
            .one(conn)
            .await?
            .is_some();
        if !exists {
            event_status::ActiveModel {
                id: Set(id),
                status: Set(status.code().to_owned()),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

/// Create permissions, event statuses and the three groups with their grants.
///
/// Safe to run repeatedly.
///
/// # Errors
/// Returns the driver error; seeding is transactional.
#[instrument(skip_all)]
pub async fn seed_authorization(db: &Db) -> Result<(), DbErr> {
    let txn = db.conn().begin().await?;
    for p in Permission::all() {
        ensure_permission(&txn, p).await?;
    }
    ensure_statuses(&txn).await?;

    for kind in ContactKind::ALL {
        let group_id = ensure_group(&txn, kind.group_name()).await?;
        for p in group_grants(kind) {
            let permission_id = ensure_permission(&txn, p).await?;
            group_permission::Entity::insert(group_permission::ActiveModel {
                group_id: Set(group_id),
                permission_id: Set(permission_id),
            })
            .on_conflict(
                OnConflict::columns([
                    group_permission::Column::GroupId,
                    group_permission::Column::PermissionId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        }
    }
    txn.commit().await?;
    info!("Authorization groups seeded");
    Ok(())
}

async fn insert_contact<C: ConnectionTrait>(
    conn: &C,
    kind: ContactKind,
    c: ContactFixture,
) -> Result<(), DbErr> {
    match kind {
        ContactKind::Sales => {
            sales_contact::ActiveModel {
                id: Set(c.id),
                user_id: Set(c.user_id),
            }
            .insert(conn)
            .await?;
        }
        ContactKind::Support => {
            support_contact::ActiveModel {
                id: Set(c.id),
                user_id: Set(c.user_id),
            }
            .insert(conn)
            .await?;
        }
        ContactKind::Staff => {
            staff_contact::ActiveModel {
                id: Set(c.id),
                user_id: Set(c.user_id),
            }
            .insert(conn)
            .await?;
        }
    }
    OrmCrmRepository
        .add_to_group(conn, c.user_id, kind.group_name())
        .await
}

/// Insert `set` in dependency order. Requires [`seed_authorization`] first.
///
/// # Errors
/// Returns the driver error, e.g. on a duplicate id; nothing is kept then.
#[instrument(skip_all, fields(users = set.users.len(), clients = set.clients.len()))]
pub async fn load(db: &Db, set: &FixtureSet) -> Result<(), DbErr> {
    let now = Utc::now();
    let txn = db.conn().begin().await?;

    for u in &set.users {
        user::ActiveModel {
            id: Set(u.id),
            username: Set(u.username.clone()),
            password_hash: Set(hash_password(&u.password)),
            is_superuser: Set(u.is_superuser),
            is_active: Set(u.is_active),
            date_joined: Set(now),
        }
        .insert(&txn)
        .await?;
    }
    for (kind, c) in set.contacts() {
        insert_contact(&txn, kind, c).await?;
    }
    for c in &set.clients {
        client::ActiveModel {
            id: Set(c.id),
            first_name: Set(c.first_name.clone()),
            last_name: Set(c.last_name.clone()),
            email: Set(c.email.clone()),
            phone: Set(c.phone.clone()),
            mobile: Set(c.mobile.clone()),
            sales_contact_id: Set(c.sales_contact_id),
            date_created: Set(now),
            date_updated: Set(now),
        }
        .insert(&txn)
        .await?;
    }
    for c in &set.contracts {
        contract::ActiveModel {
            id: Set(c.id),
            sales_contact_id: Set(c.sales_contact_id),
            client_id: Set(c.client_id),
            status: Set(c.status),
            amount: Set(c.amount),
            payment_due: Set(c.payment_due.unwrap_or(now)),
            date_created: Set(now),
            date_updated: Set(now),
        }
        .insert(&txn)
        .await?;
    }
    for e in &set.events {
        event::ActiveModel {
            id: Set(e.id),
            client_id: Set(e.client_id),
            support_contact_id: Set(e.support_contact_id),
            event_status_id: Set(e.event_status_id),
            attendees: Set(e.attendees),
            event_date: Set(e.event_date.unwrap_or(now)),
            notes: Set(e.notes.clone()),
            date_created: Set(now),
            date_updated: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        contracts = set.contracts.len(),
        events = set.events.len(),
        "Fixtures loaded"
    );
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yaml_fixture_parses_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "users:\n  - id: 3\n    username: sales_contact_01\n    password: N3wpolo6\n\
             sales_contacts:\n  - id: 1\n    user_id: 3\n\
             contracts:\n  - id: 1\n    sales_contact_id: 1\n    client_id: 1\n    amount: \"2000.00\"\n"
        )
        .unwrap();
        let set = FixtureSet::from_path(file.path()).unwrap();
        assert_eq!(set.users.len(), 1);
        assert!(set.users[0].is_active);
        assert!(!set.users[0].is_superuser);
        assert_eq!(set.contracts[0].amount, Decimal::new(200_000, 2));
        assert!(set.contracts[0].payment_due.is_none());
        assert!(set.events.is_empty());
        let kinds: Vec<_> = set.contacts().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![ContactKind::Sales]);
    }

    #[test]
    fn json_fixture_parses() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"events": [{{"id": 1, "client_id": 1, "support_contact_id": 1}}]}}"#
        )
        .unwrap();
        let set = FixtureSet::from_path(file.path()).unwrap();
        assert_eq!(set.events[0].event_status_id, 1);
        assert_eq!(set.events[0].notes, "");
    }

    #[test]
    fn unknown_extension_and_unknown_keys_are_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            FixtureSet::from_path(file.path()),
            Err(FixtureError::UnsupportedFormat(_))
        ));

        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "widgets: []").unwrap();
        assert!(matches!(
            FixtureSet::from_path(file.path()),
            Err(FixtureError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FixtureSet::from_path(Path::new("/nonexistent/epic.yaml")).unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
