//! Storage builder and handles.
//!
//! Provides a builder for constructing the storage layer and a handles
//! struct bundling the store facades.

use std::path::{Path, PathBuf};

use crate::storage::db::Db;
use crate::storage::sales_store::SalesStore;
use crate::storage::schema::init_schema;
use crate::storage::user_store::UserStore;
use crate::storage::StorageError;

/// Default connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Builder for constructing the storage layer.
pub struct StorageBuilder {
    db_path: PathBuf,
    pool_size: u32,
}

impl StorageBuilder {
    /// Create a new storage builder for the database file at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Set the connection pool size.
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Open the database, initialize the schema, and return handles.
    pub async fn build(self) -> Result<StorageHandles, StorageError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Internal(format!(
                        "failed to create database directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let db = Db::open(&self.db_path, self.pool_size).await?;
        init_schema(&db).await?;

        Ok(StorageHandles {
            sales: SalesStore::new(db.clone()),
            users: UserStore::new(db.clone()),
            db,
        })
    }
}

/// Handles to the storage layer facades.
pub struct StorageHandles {
    /// Facade for sale ingestion and reporting.
    pub sales: SalesStore,
    /// Facade for user lookup and provisioning.
    pub users: UserStore,
    db: Db,
}

impl StorageHandles {
    /// Liveness probe against the pool.
    pub async fn ping(&self) -> Result<(), StorageError> {
        self.sales.ping().await
    }

    /// Gracefully close the connection pool.
    pub async fn shutdown(self) {
        self.db.close().await;
    }
}
