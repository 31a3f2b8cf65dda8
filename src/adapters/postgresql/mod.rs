//! PostgreSQL record store
//!
//! - [`client`] - connection pool and TLS
//! - [`sql`] - DDL and upsert statements
//! - [`models`] - parameter rows
//! - [`adapter`] - the [`RecordStore`](crate::adapters::database::RecordStore) implementation

pub mod adapter;
pub mod client;
pub mod models;
pub mod sql;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
