//! Applies `sea-orm-migration` migrators against a [`Db`].

use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::{Db, DbError};

/// Apply every pending migration of `M`.
///
/// # Errors
/// Returns [`DbError::Sea`] if any migration fails; already applied
/// migrations stay applied.
pub async fn run_migrations<M: MigratorTrait>(db: &Db, module: &str) -> Result<(), DbError> {
    let pending = M::get_pending_migrations(db.conn()).await?.len();
    if pending == 0 {
        info!(module, "database schema is up to date");
        return Ok(());
    }

    info!(module, pending, "applying migrations");
    M::up(db.conn(), None).await?;
    info!(module, "migrations applied");
    Ok(())
}
