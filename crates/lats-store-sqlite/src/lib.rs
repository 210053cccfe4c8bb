//! SQLite backend for the LATS remote store contract.
//!
//! Every table holds JSON documents keyed by `id`, which lets one generic
//! implementation serve the whole fixed set of entity tables while still
//! enforcing the unique constraints the data layer relies on as a backstop.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod query;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::{TABLES, VIEWS};
pub use store::SqliteStore;
