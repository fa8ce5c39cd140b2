//! Database schema definitions.

use crate::storage::db::Db;
use crate::storage::StorageError;

/// SQL statement for creating the sales table.
///
/// `id` is supplied by the point-of-sale client and is the natural key for
/// idempotent upsert. `date` holds the canonical `YYYY-MM-DD` form so
/// strftime-based report matching is well defined. `synced` marks rows that
/// arrived through the sync endpoint rather than local entry.
pub const SALES_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS sales (
    id      INTEGER PRIMARY KEY,
    date    TEXT NOT NULL,
    cashier TEXT NOT NULL,
    product TEXT NOT NULL,
    amount  REAL NOT NULL,
    synced  INTEGER NOT NULL DEFAULT 0
);
"#;

/// Index backing the report queries, which all filter on `date`.
pub const SALES_DATE_INDEX_DDL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sales_date ON sales (date);
"#;

/// SQL statement for creating the users table.
///
/// `password_hash` is a salted one-way bcrypt hash, written only by the
/// out-of-band `add-user` provisioning binary.
pub const USERS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username      TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'staff'
);
"#;

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist.
pub async fn init_schema(db: &Db) -> Result<(), StorageError> {
    sqlx::query(SALES_TABLE_DDL).execute(db.inner()).await?;
    sqlx::query(SALES_DATE_INDEX_DDL)
        .execute(db.inner())
        .await?;
    sqlx::query(USERS_TABLE_DDL).execute(db.inner()).await?;

    tracing::info!("Database schema initialized");
    Ok(())
}
