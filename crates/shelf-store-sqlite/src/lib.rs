//! SQLite backend for the Shelf storefront.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-row write is a single
//! `BEGIN IMMEDIATE` transaction, which takes SQLite's write lock up front and
//! so serialises concurrent merges, default-address changes and order inserts.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
