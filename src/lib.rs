//! tillsync - Sales Sync & Reporting Library
//!
//! Core functionality for the tillsync backend: idempotent ingestion of
//! batched point-of-sale records and paginated daily/monthly/yearly reports
//! over a single-file SQLite database, with optional Basic-auth gating of
//! the ingestion endpoint.
//!
//! # Architecture
//!
//! - **Storage**: SQLite persistence behind store facades ([`storage`])
//! - **Auth**: Basic credential parsing and role checks ([`auth`])
//! - **Server**: Axum HTTP surface ([`server`])
//! - **Config**: YAML configuration ([`config`])

pub mod auth;
pub mod config;
pub mod server;
pub mod storage;

pub use config::AppConfig;
pub use server::{create_router, AppState};
pub use storage::{SalesStore, StorageBuilder, StorageHandles, UserStore};
