//! SQLite backend for Canvass.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The schema is versioned; see
//! [`SqliteStore::migrate_to`].

mod encode;
mod migrations;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use migrations::latest_version;
pub use store::SqliteStore;
