//! Database initialization
//!
//! Opens (creating if needed) the local marketing store and makes sure every
//! table the connectors rely on exists. All statements are idempotent, so
//! calling [`init_database`] on an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // A batch run streams one query while saving through another connection
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL lets the streaming reader and the writer proceed side by side
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create every table used by the local store
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_contacts_table(pool).await?;
    create_companies_table(pool).await?;
    create_contact_companies_table(pool).await?;
    create_field_definitions_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the contacts table
///
/// `fields` holds declared custom field values as a JSON object.
async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            firstname TEXT,
            lastname TEXT,
            email TEXT,
            phone TEXT,
            mobile TEXT,
            position TEXT,
            address1 TEXT,
            address2 TEXT,
            city TEXT,
            state TEXT,
            zipcode TEXT,
            country TEXT,
            points INTEGER NOT NULL DEFAULT 0,
            date_added INTEGER NOT NULL,
            fields TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_date_added ON contacts(date_added)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_companies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            email TEXT,
            phone TEXT,
            fax TEXT,
            address1 TEXT,
            address2 TEXT,
            city TEXT,
            state TEXT,
            zipcode TEXT,
            country TEXT,
            website TEXT,
            description TEXT,
            date_added INTEGER NOT NULL,
            fields TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_companies_date_added ON companies(date_added)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Contact ↔ company association; at most one primary company per contact
async fn create_contact_companies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_companies (
            contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
            company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            is_primary INTEGER NOT NULL DEFAULT 0,
            date_added INTEGER NOT NULL,
            PRIMARY KEY (contact_id, company_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Custom local fields declared per object ("contact" or "company")
async fn create_field_definitions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS field_definitions (
            object TEXT NOT NULL,
            alias TEXT NOT NULL,
            label TEXT NOT NULL DEFAULT '',
            field_type TEXT NOT NULL DEFAULT 'text',
            PRIMARY KEY (object, alias)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
