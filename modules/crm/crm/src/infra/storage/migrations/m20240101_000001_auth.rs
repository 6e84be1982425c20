use sea_orm_migration::prelude::*;

use super::execute_all;

#[derive(DeriveMigrationName)]
pub struct Migration;

const UP: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS auth_users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username VARCHAR(150) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        date_joined TEXT NOT NULL
    )",
    r"
    CREATE TABLE IF NOT EXISTS auth_permissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        codename VARCHAR(100) NOT NULL UNIQUE,
        name VARCHAR(255) NOT NULL
    )",
    r"
    CREATE TABLE IF NOT EXISTS auth_groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(150) NOT NULL UNIQUE
    )",
    r"
    CREATE TABLE IF NOT EXISTS auth_group_permissions (
        group_id INTEGER NOT NULL REFERENCES auth_groups(id) ON DELETE CASCADE,
        permission_id INTEGER NOT NULL REFERENCES auth_permissions(id) ON DELETE CASCADE,
        PRIMARY KEY (group_id, permission_id)
    )",
    r"
    CREATE TABLE IF NOT EXISTS auth_user_groups (
        user_id INTEGER NOT NULL REFERENCES auth_users(id) ON DELETE CASCADE,
        group_id INTEGER NOT NULL REFERENCES auth_groups(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, group_id)
    )",
    r"
    CREATE TABLE IF NOT EXISTS auth_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES auth_users(id) ON DELETE CASCADE,
        token_hash CHAR(64) NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id)",
];

const DOWN: &[&str] = &[
    "DROP TABLE IF EXISTS auth_sessions",
    "DROP TABLE IF EXISTS auth_user_groups",
    "DROP TABLE IF EXISTS auth_group_permissions",
    "DROP TABLE IF EXISTS auth_groups",
    "DROP TABLE IF EXISTS auth_permissions",
    "DROP TABLE IF EXISTS auth_users",
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
