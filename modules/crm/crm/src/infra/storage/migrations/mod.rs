use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

mod m20240101_000001_auth;
mod m20240101_000002_crm;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_auth::Migration),
            Box::new(m20240101_000002_crm::Migration),
        ]
    }
}

/// Run each statement in order. `SQLite` only accepts one statement per call.
async fn execute_all(manager: &SchemaManager<'_>, statements: &[&str]) -> Result<(), DbErr> {
    let conn = manager.get_connection();
    for sql in statements {
        conn.execute_unprepared(sql).await?;
    }
    Ok(())
}
