//! Storage Layer
//!
//! SQLite persistence for sales and users behind small store facades:
//!
//! - [`SalesStore`]: idempotent batch sync and report queries
//! - [`UserStore`]: user provisioning and credential verification
//! - [`StorageBuilder`] / [`StorageHandles`]: initialization and lifecycle
//!
//! One WAL-mode connection pool backs everything; writes serialize on
//! SQLite's writer lock, reads run against a snapshot.

mod builder;
mod db;
mod error;
mod schema;
mod types;

pub mod sales_store;
pub mod user_store;

pub use builder::{StorageBuilder, StorageHandles, DEFAULT_POOL_SIZE};
pub use db::Db;
pub use error::StorageError;
pub use sales_store::{ReportPage, ReportQuery, ReportRow, SalesStore, SyncReceipt};
pub use types::{parse_sale_date, Granularity, Period, Sale, SaleRecord, ValidationError};
pub use user_store::UserStore;
