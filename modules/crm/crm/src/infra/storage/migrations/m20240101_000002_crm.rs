use sea_orm_migration::prelude::*;

use super::execute_all;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Amounts are stored as REAL and rescaled to two places when mapped.
const UP: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS sales_contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES auth_users(id) ON DELETE CASCADE
    )",
    r"
    CREATE TABLE IF NOT EXISTS support_contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES auth_users(id) ON DELETE CASCADE
    )",
    r"
    CREATE TABLE IF NOT EXISTS staff_contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES auth_users(id) ON DELETE CASCADE
    )",
    r"
    CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name VARCHAR(25) NOT NULL,
        last_name VARCHAR(25) NOT NULL,
        email VARCHAR(100) NOT NULL UNIQUE,
        phone VARCHAR(20) NOT NULL DEFAULT '',
        mobile VARCHAR(20) NOT NULL DEFAULT '',
        sales_contact_id INTEGER NOT NULL REFERENCES sales_contacts(id) ON DELETE CASCADE,
        date_created TEXT NOT NULL,
        date_updated TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_clients_sales_contact ON clients(sales_contact_id)",
    r"
    CREATE TABLE IF NOT EXISTS contracts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sales_contact_id INTEGER NOT NULL REFERENCES sales_contacts(id) ON DELETE CASCADE,
        client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        status BOOLEAN NOT NULL DEFAULT FALSE,
        amount REAL NOT NULL,
        payment_due TEXT NOT NULL,
        date_created TEXT NOT NULL,
        date_updated TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_contracts_sales_contact ON contracts(sales_contact_id)",
    "CREATE INDEX IF NOT EXISTS idx_contracts_client ON contracts(client_id)",
    r"
    CREATE TABLE IF NOT EXISTS event_statuses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        status CHAR(1) NOT NULL UNIQUE
    )",
    r"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        support_contact_id INTEGER NOT NULL REFERENCES support_contacts(id) ON DELETE CASCADE,
        event_status_id INTEGER NOT NULL REFERENCES event_statuses(id) ON DELETE CASCADE,
        attendees INTEGER NOT NULL DEFAULT 0,
        event_date TEXT NOT NULL,
        notes VARCHAR(2048) NOT NULL DEFAULT '',
        date_created TEXT NOT NULL,
        date_updated TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_events_client ON events(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_support_contact ON events(support_contact_id)",
];

const DOWN: &[&str] = &[
    "DROP TABLE IF EXISTS events",
    "DROP TABLE IF EXISTS event_statuses",
    "DROP TABLE IF EXISTS contracts",
    "DROP TABLE IF EXISTS clients",
    "DROP TABLE IF EXISTS staff_contacts",
    "DROP TABLE IF EXISTS support_contacts",
    "DROP TABLE IF EXISTS sales_contacts",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        execute_all(manager, UP).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        execute_all(manager, DOWN).await
    }
}
