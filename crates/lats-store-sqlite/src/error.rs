//! Error type for `lats-store-sqlite`.

use lats_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("relation {0:?} does not exist")]
  UnknownTable(String),

  #[error("no relationship between {from:?} and {to:?}")]
  UnknownRelation { from: String, to: String },

  #[error("invalid column name: {0:?}")]
  InvalidColumn(String),

  #[error("{0:?} is a read-only view")]
  ReadOnly(String),

  #[error("duplicate {column} {value:?} in {table}")]
  Duplicate {
    table:  String,
    column: String,
    value:  String,
  },

  #[error("stored row in {0} is not a JSON object")]
  MalformedRow(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for StoreError {
  fn from(err: Error) -> Self {
    match err {
      Error::UnknownTable(table) => StoreError::undefined_table(&table),
      Error::UnknownRelation { from, to } => StoreError::undefined_relation(&from, &to),
      Error::InvalidColumn(_) | Error::ReadOnly(_) => {
        StoreError::invalid_input(err.to_string())
      }
      Error::Duplicate { table, column, value } => StoreError::unique_violation(format!(
        "duplicate key value violates unique constraint \"{table}_{column}_key\""
      ))
      .with_details(format!("Key ({column})=({value}) already exists.")),
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        StoreError::unavailable("connection closed")
      }
      other => StoreError::new(StoreErrorKind::Other, "XX000", other.to_string()),
    }
  }
}
