//! Ordered read strategies with a uniform output.
//!
//! A [`QueryPlan`] lists the ways a read can be answered, richest first. The
//! plan tries them in order and stops at the first success. If every strategy
//! fails, the caller gets the first strategy's error, since that is the one
//! describing the read that was actually wanted.

use std::{collections::HashMap, future::Future, pin::Pin};

use lats_core::store::Row;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  normalize::Fields,
};

type Attempt<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;
type Strategy<'a, T> = Box<dyn FnOnce() -> Attempt<'a, T> + Send + 'a>;

pub struct QueryPlan<'a, T> {
  name:       &'static str,
  strategies: Vec<(&'static str, Strategy<'a, T>)>,
}

impl<'a, T> QueryPlan<'a, T> {
  pub fn new(name: &'static str) -> Self { Self { name, strategies: Vec::new() } }

  /// Append a strategy. It is only started if every earlier one failed.
  pub fn then<F, Fut>(mut self, label: &'static str, strategy: F) -> Self
  where
    F: FnOnce() -> Fut + Send + 'a,
    Fut: Future<Output = Result<T>> + Send + 'a,
  {
    self
      .strategies
      .push((label, Box::new(move || Box::pin(strategy()) as Attempt<'a, T>)));
    self
  }

  pub async fn run(self) -> Result<T> {
    let Self { name, strategies } = self;
    let mut first_error = None;

    for (index, (label, strategy)) in strategies.into_iter().enumerate() {
      match strategy().await {
        Ok(value) => {
          if index > 0 {
            info!(plan = name, strategy = label, "fallback strategy answered the read");
          }
          return Ok(value);
        }
        Err(err) => {
          warn!(plan = name, strategy = label, error = %err, "read strategy failed");
          first_error.get_or_insert(err);
        }
      }
    }

    Err(first_error.unwrap_or(Error::NotFound(name)))
  }
}

/// Await a secondary slice of a read. A failure is logged and the slice is
/// treated as empty.
pub async fn or_empty<T: Default>(slice: &'static str, read: impl Future<Output = Result<T>>) -> T {
  match read.await {
    Ok(value) => value,
    Err(err) => {
      warn!(slice, error = %err, "secondary read failed, continuing without it");
      T::default()
    }
  }
}

// ─── Stitching ───────────────────────────────────────────────────────────────

pub(crate) fn has_object(row: &Row, key: &str) -> bool { row.get(key).is_some_and(Value::is_object) }

pub(crate) fn has_array(row: &Row, key: &str) -> bool { row.get(key).is_some_and(Value::is_array) }

/// Attach `refs` under `key` to every row whose `fk` points at one of them
/// and that has no `key` object yet.
pub(crate) fn stitch_one(rows: &mut [Row], key: &str, fk: &str, refs: Vec<Row>) {
  let by_id: HashMap<Uuid, Row> = refs.into_iter().map(|r| (Fields::new(&r).id(), r)).collect();
  for row in rows.iter_mut().filter(|r| !has_object(r, key)) {
    let target = Fields::new(row).uuid(fk).and_then(|id| by_id.get(&id));
    let value = target.cloned().map_or(Value::Null, Value::Object);
    row.insert(key.to_owned(), value);
  }
}

/// Group `children` by `fk` and attach each group under `key`, leaving rows
/// that already carry a `key` array alone.
pub(crate) fn stitch_many(rows: &mut [Row], key: &str, fk: &str, children: Vec<Row>) {
  let mut by_parent: HashMap<Uuid, Vec<Value>> = HashMap::new();
  for child in children {
    if let Some(parent) = Fields::new(&child).uuid(fk) {
      by_parent.entry(parent).or_default().push(Value::Object(child));
    }
  }
  for row in rows.iter_mut().filter(|r| !has_array(r, key)) {
    let id = Fields::new(row).id();
    row.insert(key.to_owned(), Value::Array(by_parent.remove(&id).unwrap_or_default()));
  }
}
