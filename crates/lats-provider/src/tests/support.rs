//! Shared fixtures: an in-memory store with fault injection.

use std::sync::{Arc, Mutex};

use lats_core::{
  Session,
  event::{DomainEvent, EventSink},
  product::{NewProduct, NewVariant},
  store::{Filter, RemoteStore, Row, Rows, Select, StoreError},
};
use lats_store_sqlite::SqliteStore;

use crate::{DataProvider, ProviderConfig, Throttler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Select,
  Insert,
  Update,
  Delete,
}

struct Rule {
  op:    Op,
  table: String,
  /// Only selects that embed this table.
  embed: Option<String>,
  error: StoreError,
}

/// A [`SqliteStore`] that fails chosen calls and counts every call.
pub struct FlakyStore {
  inner: SqliteStore,
  rules: Mutex<Vec<Rule>>,
  calls: Mutex<Vec<(Op, String)>>,
}

impl FlakyStore {
  pub fn new(inner: SqliteStore) -> Self {
    Self { inner, rules: Mutex::default(), calls: Mutex::default() }
  }

  pub fn inner(&self) -> &SqliteStore { &self.inner }

  /// Fail every `op` on `table` with `error`.
  pub fn fail(&self, op: Op, table: &str, error: StoreError) {
    self.rules.lock().unwrap().push(Rule { op, table: table.to_owned(), embed: None, error });
  }

  /// Fail every select on `table` that embeds `embedded`.
  pub fn fail_embed(&self, table: &str, embedded: &str, error: StoreError) {
    self.rules.lock().unwrap().push(Rule {
      op:    Op::Select,
      table: table.to_owned(),
      embed: Some(embedded.to_owned()),
      error,
    });
  }

  pub fn heal(&self) { self.rules.lock().unwrap().clear(); }

  pub fn calls(&self, op: Op, table: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|(o, t)| *o == op && t == table)
      .count()
  }

  fn check(&self, op: Op, table: &str, query: Option<&Select>) -> Result<(), StoreError> {
    self.calls.lock().unwrap().push((op, table.to_owned()));
    let rules = self.rules.lock().unwrap();
    let hit = rules.iter().find(|r| {
      r.op == op
        && r.table == table
        && r.embed.as_deref().is_none_or(|e| query.is_some_and(|q| q.embeds_table(e)))
    });
    match hit {
      Some(rule) => Err(rule.error.clone()),
      None => Ok(()),
    }
  }
}

impl RemoteStore for FlakyStore {
  async fn select(&self, table: &str, query: &Select) -> Result<Rows, StoreError> {
    self.check(Op::Select, table, Some(query))?;
    self.inner.select(table, query).await
  }

  async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
    self.check(Op::Insert, table, None)?;
    self.inner.insert(table, rows).await
  }

  async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
    self.check(Op::Update, table, None)?;
    self.inner.update(table, patch, filters).await
  }

  async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
    self.check(Op::Delete, table, None)?;
    self.inner.delete(table, filters).await
  }
}

/// Records every event it is handed.
#[derive(Default)]
pub struct Recorder {
  events: Mutex<Vec<DomainEvent>>,
}

impl Recorder {
  pub fn topics(&self) -> Vec<String> {
    self
      .events
      .lock()
      .unwrap()
      .iter()
      .map(|e| e.topic().to_owned())
      .collect()
  }
}

impl EventSink for Recorder {
  fn emit(&self, event: DomainEvent) { self.events.lock().unwrap().push(event); }
}

pub struct Fixture {
  pub provider: DataProvider<FlakyStore>,
  pub events:   Arc<Recorder>,
}

impl Fixture {
  pub fn store(&self) -> &FlakyStore { self.provider.store() }
}

pub async fn fixture() -> Fixture {
  let store  = SqliteStore::open_in_memory().await.expect("in-memory store");
  let events = Arc::new(Recorder::default());
  let provider = DataProvider::new(FlakyStore::new(store), ProviderConfig::default())
    .with_throttler(Throttler::passthrough())
    .with_events(events.clone());
  Fixture { provider, events }
}

pub fn session() -> Session { Session::new("clerk-1") }

pub fn variant(sku: &str, quantity: i64, cost: f64, price: f64) -> NewVariant {
  NewVariant {
    sku: Some(sku.to_owned()),
    name: Some(sku.to_owned()),
    cost_price: Some(cost),
    selling_price: Some(price),
    quantity: Some(quantity),
    ..Default::default()
  }
}

pub fn product(name: &str, variants: Vec<NewVariant>) -> NewProduct {
  NewProduct { name: name.to_owned(), variants, ..Default::default() }
}

/// Count rows of `table` directly in the underlying store.
pub async fn count(store: &FlakyStore, table: &str, filter: Option<Filter>) -> usize {
  let mut query = Select::all();
  if let Some(filter) = filter {
    query = query.filter(filter);
  }
  store.inner().select(table, &query).await.unwrap().rows.len()
}
