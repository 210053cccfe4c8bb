//! [`SqliteStore`]: the SQLite implementation of [`RemoteStore`].

use std::path::Path;

use lats_core::store::{Filter, RemoteStore, Row, Rows, Select, StoreError};

use crate::{Result, query, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A LATS remote store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn select_rows(&self, table: &str, select: &Select) -> Result<Rows> {
    let table = table.to_owned();
    let select = select.clone();
    self
      .conn
      .call(move |conn| Ok(query::select(conn, &table, &select)))
      .await?
  }

  pub async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(query::insert(conn, &table, rows)))
      .await?
  }

  pub async fn update_rows(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>> {
    let table   = table.to_owned();
    let filters = filters.to_vec();
    self
      .conn
      .call(move |conn| Ok(query::update(conn, &table, &patch, &filters)))
      .await?
  }

  pub async fn delete_rows(&self, table: &str, filters: &[Filter]) -> Result<u64> {
    let table   = table.to_owned();
    let filters = filters.to_vec();
    self
      .conn
      .call(move |conn| Ok(query::delete(conn, &table, &filters)))
      .await?
  }
}

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for SqliteStore {
  async fn select(&self, table: &str, query: &Select) -> Result<Rows, StoreError> {
    Ok(self.select_rows(table, query).await?)
  }

  async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
    Ok(self.insert_rows(table, rows).await?)
  }

  async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
    Ok(self.update_rows(table, patch, filters).await?)
  }

  async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
    Ok(self.delete_rows(table, filters).await?)
  }
}
