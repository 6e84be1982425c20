//! Database layer for the EPIC CRM.
//!
//! - [`connect_db`] opens a pooled `SeaORM` connection from a DSN
//! - [`migration_runner`] applies a module's migrations
//! - [`secure`] turns an `AccessScope` into SQL so every query is row-filtered

pub mod migration_runner;
pub mod secure;

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use serde::Deserialize;

pub use sea_orm;
pub use sea_orm_migration;

/// Errors raised while opening or migrating a database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sea(#[from] DbErr),

    #[error("invalid database configuration: {0}")]
    InvalidConfig(String),
}

/// Pool settings. Unset values keep the driver defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
}

/// Cheaply cloneable handle over the connection pool.
#[derive(Clone, Debug)]
pub struct Db {
    conn: DatabaseConnection,
}

impl Db {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    #[must_use]
    pub fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }
}

/// Connect to `dsn` and prepare the session.
///
/// `SQLite` connections get `PRAGMA foreign_keys = ON` so that cascading
/// deletes declared in migrations are honoured.
///
/// # Errors
/// Returns [`DbError::InvalidConfig`] for an empty DSN or inconsistent pool
/// sizes, and [`DbError::Sea`] if the connection cannot be established.
pub async fn connect_db(dsn: &str, opts: &ConnectOpts) -> Result<Db, DbError> {
    if dsn.trim().is_empty() {
        return Err(DbError::InvalidConfig("dsn must not be empty".to_owned()));
    }
    if let (Some(min), Some(max)) = (opts.min_conns, opts.max_conns)
        && min > max
    {
        return Err(DbError::InvalidConfig(format!(
            "min_conns ({min}) exceeds max_conns ({max})"
        )));
    }

    let mut options = ConnectOptions::new(dsn.to_owned());
    if let Some(max) = opts.max_conns {
        options.max_connections(max);
    }
    if let Some(min) = opts.min_conns {
        options.min_connections(min);
    }
    if let Some(secs) = opts.connect_timeout_secs {
        options.connect_timeout(Duration::from_secs(secs));
    }
    options.sqlx_logging(false);

    let conn = Database::connect(options).await?;
    if conn.get_database_backend() == DbBackend::Sqlite {
        conn.execute_unprepared("PRAGMA foreign_keys = ON").await?;
    }

    tracing::debug!(backend = ?conn.get_database_backend(), "database connected");
    Ok(Db::new(conn))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_dsn_is_rejected() {
        let err = connect_db("  ", &ConnectOpts::default()).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn inverted_pool_bounds_are_rejected() {
        let opts = ConnectOpts {
            max_conns: Some(1),
            min_conns: Some(4),
            ..Default::default()
        };
        let err = connect_db("sqlite::memory:", &opts).await.unwrap_err();
        assert!(err.to_string().contains("min_conns"));
    }

    #[tokio::test]
    async fn sqlite_memory_connects_with_foreign_keys() {
        let opts = ConnectOpts {
            max_conns: Some(1),
            min_conns: Some(1),
            ..Default::default()
        };
        let db = connect_db("sqlite::memory:", &opts).await.unwrap();
        assert_eq!(db.backend(), DbBackend::Sqlite);

        let row = db
            .conn()
            .query_one(sea_orm::Statement::from_string(
                DbBackend::Sqlite,
                "PRAGMA foreign_keys",
            ))
            .await
            .unwrap()
            .unwrap();
        let enabled: i32 = row.try_get_by_index(0).unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn connect_opts_parse_from_yaml() {
        let yaml = "max_conns: 4\nconnect_timeout_secs: 3\n";
        let opts: ConnectOpts = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(opts.max_conns, Some(4));
        assert_eq!(opts.min_conns, None);
        assert_eq!(opts.connect_timeout_secs, Some(3));
    }

    #[test]
    fn connect_opts_reject_unknown_fields() {
        let yaml = "max_connections: 4\n";
        assert!(serde_saphyr::from_str::<ConnectOpts>(yaml).is_err());
    }
}
