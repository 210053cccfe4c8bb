//! The `RemoteStore` trait and supporting query types.
//!
//! The remote store is an opaque relational service offering single-table
//! `select/insert/update/delete` with filtering, ordering, ranges and shallow
//! embeds, but no cross-statement atomicity. Every multi-step guarantee the
//! rest of the workspace makes is built on top of this contract, never inside
//! it.

use std::future::Future;

use serde_json::{Map, Value};
use thiserror::Error;

/// A wire row: a flat, snake_cased JSON object. Embedded relations appear as
/// nested objects (to-one) or arrays (to-many) under their alias.
pub type Row = Map<String, Value>;

// ─── Filters ─────────────────────────────────────────────────────────────────

/// A single predicate on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  Eq(String, Value),
  Neq(String, Value),
  In(String, Vec<Value>),
  /// Case-insensitive set membership on a text column.
  InIgnoreCase(String, Vec<String>),
  /// Case-insensitive `LIKE`; `%` and `_` are wildcards and `\` escapes
  /// the character after it.
  ILike(String, String),
  Lt(String, Value),
  Gt(String, Value),
  IsNull(String),
}

/// Escape `text` so that every character in it matches literally inside an
/// [`Filter::ILike`] pattern.
pub fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

impl Filter {
  pub fn eq(column: &str, value: impl Into<Value>) -> Self {
    Self::Eq(column.to_owned(), value.into())
  }

  pub fn neq(column: &str, value: impl Into<Value>) -> Self {
    Self::Neq(column.to_owned(), value.into())
  }

  pub fn any_of<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
    Self::In(column.to_owned(), values.into_iter().map(Into::into).collect())
  }

  pub fn any_of_ignore_case<S: Into<String>>(
    column: &str,
    values: impl IntoIterator<Item = S>,
  ) -> Self {
    Self::InIgnoreCase(column.to_owned(), values.into_iter().map(Into::into).collect())
  }

  pub fn ilike(column: &str, pattern: impl Into<String>) -> Self {
    Self::ILike(column.to_owned(), pattern.into())
  }

  /// Case-insensitive substring match on literal `text`.
  pub fn contains(column: &str, text: &str) -> Self {
    Self::ilike(column, format!("%{}%", escape_like(text)))
  }

  pub fn lt(column: &str, value: impl Into<Value>) -> Self {
    Self::Lt(column.to_owned(), value.into())
  }

  pub fn gt(column: &str, value: impl Into<Value>) -> Self {
    Self::Gt(column.to_owned(), value.into())
  }

  pub fn is_null(column: &str) -> Self { Self::IsNull(column.to_owned()) }

  pub fn column(&self) -> &str {
    match self {
      Self::Eq(c, _)
      | Self::Neq(c, _)
      | Self::In(c, _)
      | Self::InIgnoreCase(c, _)
      | Self::ILike(c, _)
      | Self::Lt(c, _)
      | Self::Gt(c, _)
      | Self::IsNull(c) => c,
    }
  }
}

// ─── Ordering and ranges ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Asc,
  Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub column:    String,
  pub direction: Direction,
}

/// Zero-based `offset` plus a maximum row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub offset: u64,
  pub limit:  u64,
}

// ─── Embeds ──────────────────────────────────────────────────────────────────

/// How an embedded relation is linked to the row that embeds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
  /// The embedding row holds the foreign key in `local_column`; the embed is
  /// a single object, or `null` when the target row is missing.
  ToOne { local_column: String },
  /// The embedded rows hold the embedding row's id in `foreign_column`; the
  /// embed is an array.
  ToMany { foreign_column: String },
}

/// A shallow relational join expressed as a nested column spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
  pub table:   String,
  pub alias:   String,
  pub link:    Link,
  pub columns: Vec<String>,
  pub order:   Vec<Order>,
  pub embeds:  Vec<Embed>,
}

impl Embed {
  pub fn to_one(table: &str, alias: &str, local_column: &str) -> Self {
    Self {
      table:   table.to_owned(),
      alias:   alias.to_owned(),
      link:    Link::ToOne { local_column: local_column.to_owned() },
      columns: Vec::new(),
      order:   Vec::new(),
      embeds:  Vec::new(),
    }
  }

  pub fn to_many(table: &str, alias: &str, foreign_column: &str) -> Self {
    Self {
      table:   table.to_owned(),
      alias:   alias.to_owned(),
      link:    Link::ToMany { foreign_column: foreign_column.to_owned() },
      columns: Vec::new(),
      order:   Vec::new(),
      embeds:  Vec::new(),
    }
  }

  pub fn columns(mut self, columns: &[&str]) -> Self {
    self.columns = columns.iter().map(|c| (*c).to_owned()).collect();
    self
  }

  pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
    self.order.push(Order { column: column.to_owned(), direction });
    self
  }

  pub fn embed(mut self, embed: Embed) -> Self {
    self.embeds.push(embed);
    self
  }

  /// True if this embed or any nested embed reads `table`.
  pub fn touches(&self, table: &str) -> bool {
    self.table == table || self.embeds.iter().any(|e| e.touches(table))
  }
}

// ─── Select ──────────────────────────────────────────────────────────────────

/// Parameters for [`RemoteStore::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
  /// Projected columns; empty means every column.
  pub columns: Vec<String>,
  pub embeds:  Vec<Embed>,
  pub filters: Vec<Filter>,
  pub order:   Vec<Order>,
  pub range:   Option<Range>,
  /// Ask for an exact count of matching rows, ignoring `range`.
  pub count:   bool,
}

impl Select {
  pub fn all() -> Self { Self::default() }

  pub fn columns(mut self, columns: &[&str]) -> Self {
    self.columns = columns.iter().map(|c| (*c).to_owned()).collect();
    self
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn embed(mut self, embed: Embed) -> Self {
    self.embeds.push(embed);
    self
  }

  pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
    self.order.push(Order { column: column.to_owned(), direction });
    self
  }

  pub fn range(mut self, offset: u64, limit: u64) -> Self {
    self.range = Some(Range { offset, limit });
    self
  }

  /// Range for 1-based page `page` of `limit` rows. A page past the end of
  /// any table saturates the offset rather than overflowing.
  pub fn page(self, page: u64, limit: u64) -> Self {
    let offset = page.saturating_sub(1).saturating_mul(limit);
    self.range(offset, limit)
  }

  pub fn with_count(mut self) -> Self {
    self.count = true;
    self
  }

  /// True if any embed (at any depth) reads `table`.
  pub fn embeds_table(&self, table: &str) -> bool {
    self.embeds.iter().any(|e| e.touches(table))
  }
}

/// Result of [`RemoteStore::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
  pub rows:  Vec<Row>,
  /// Present only when [`Select::count`] was requested.
  pub count: Option<u64>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Coarse classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  UniqueViolation,
  ForeignKeyViolation,
  PermissionDenied,
  NotFound,
  UndefinedTable,
  UndefinedRelation,
  InvalidInput,
  Unavailable,
  Other,
}

/// A failure reported by the remote store.
///
/// `code` carries the store's own machine code (`23505`, `42501`,
/// `PGRST116`, ...). It is meant for logs, never for end users.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({code})")]
pub struct StoreError {
  pub kind:    StoreErrorKind,
  pub code:    String,
  pub message: String,
  pub details: Option<String>,
}

impl StoreError {
  pub fn new(kind: StoreErrorKind, code: &str, message: impl Into<String>) -> Self {
    Self { kind, code: code.to_owned(), message: message.into(), details: None }
  }

  pub fn with_details(mut self, details: impl Into<String>) -> Self {
    self.details = Some(details.into());
    self
  }

  pub fn unique_violation(message: impl Into<String>) -> Self {
    Self::new(StoreErrorKind::UniqueViolation, "23505", message)
  }

  pub fn permission_denied(message: impl Into<String>) -> Self {
    Self::new(StoreErrorKind::PermissionDenied, "42501", message)
  }

  pub fn undefined_table(table: &str) -> Self {
    Self::new(
      StoreErrorKind::UndefinedTable,
      "42P01",
      format!("relation \"{table}\" does not exist"),
    )
  }

  pub fn undefined_relation(from: &str, to: &str) -> Self {
    Self::new(
      StoreErrorKind::UndefinedRelation,
      "PGRST200",
      format!("Could not find a relationship between '{from}' and '{to}'"),
    )
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::new(StoreErrorKind::InvalidInput, "22P02", message)
  }

  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::new(StoreErrorKind::Unavailable, "08006", message)
  }

  /// True for failures that mean "this table or relation is not there", as
  /// opposed to a rejected call against one that is.
  pub fn is_missing_relation(&self) -> bool {
    matches!(
      self.kind,
      StoreErrorKind::UndefinedTable | StoreErrorKind::UndefinedRelation
    )
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the remote relational store.
///
/// Each call is a single statement. A multi-row `insert` is atomic on its
/// own; nothing spans two calls.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RemoteStore: Send + Sync {
  /// Read rows from `table`.
  fn select<'a>(
    &'a self,
    table: &'a str,
    query: &'a Select,
  ) -> impl Future<Output = Result<Rows, StoreError>> + Send + 'a;

  /// Insert `rows` into `table` and return them as stored. The store assigns
  /// `id`, `created_at` and `updated_at` where the caller left them out.
  fn insert<'a>(
    &'a self,
    table: &'a str,
    rows: Vec<Row>,
  ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send + 'a;

  /// Merge `patch` into every row matching `filters` and return the results.
  fn update<'a>(
    &'a self,
    table: &'a str,
    patch: Row,
    filters: &'a [Filter],
  ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send + 'a;

  /// Delete every row matching `filters`; returns the number removed.
  fn delete<'a>(
    &'a self,
    table: &'a str,
    filters: &'a [Filter],
  ) -> impl Future<Output = Result<u64, StoreError>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_offsets_are_one_based() {
    let query = Select::all().page(3, 20);
    assert_eq!(query.range, Some(Range { offset: 40, limit: 20 }));

    let first = Select::all().page(0, 20);
    assert_eq!(first.range, Some(Range { offset: 0, limit: 20 }));
  }

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    assert_eq!(
      Filter::contains("name", "W_dget"),
      Filter::ILike("name".into(), "%W\\_dget%".into())
    );
  }

  #[test]
  fn huge_page_saturates() {
    let query = Select::all().page(u64::MAX, 100);
    assert_eq!(query.range, Some(Range { offset: u64::MAX, limit: 100 }));
  }
}
