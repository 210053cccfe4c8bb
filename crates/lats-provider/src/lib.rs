//! The LATS data provider: the resilience layer between the back-office UI
//! and the remote store.
//!
//! [`DataProvider`] is the public operation surface. Every store call it makes
//! goes through a [`Throttler`]; multi-entity writes run as compensating
//! [`saga::Saga`]s; list and detail reads are [`plan::QueryPlan`]s that
//! degrade from joined queries to flat reads stitched in memory; rows are
//! mapped to and from the domain model by [`normalize`] only; committed
//! writes are announced on an [`EventSink`].

mod agents;
mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod normalize;
pub mod plan;
mod products;
mod purchase_orders;
pub mod saga;
mod sales;
mod spare_parts;
pub mod throttle;
pub mod validate;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use lats_core::{
  Session,
  event::{DomainEvent, EventSink, NullSink},
  store::{Filter, RemoteStore, Row, Select},
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub use config::{ProviderConfig, ThrottleConfig};
pub use error::{Error, Result, ValidationError, respond};
pub use events::EventBus;
pub use throttle::{ThrottledStore, Throttler};

use crate::{error::RemoteContext, saga::Compensation};

/// Store table names.
pub(crate) mod table {
  pub const CATEGORIES: &str = "lats_categories";
  pub const BRANDS: &str = "lats_brands";
  pub const SUPPLIERS: &str = "lats_suppliers";
  pub const SHELVES: &str = "lats_store_shelves";
  pub const ROOMS: &str = "lats_storage_rooms";
  pub const LOCATIONS: &str = "lats_store_locations";
  pub const PRODUCTS: &str = "lats_products";
  pub const VARIANTS: &str = crate::validate::VARIANTS;
  pub const IMAGES: &str = "lats_product_images";
  pub const MOVEMENTS: &str = "lats_stock_movements";
  pub const ORDERS: &str = "lats_purchase_orders";
  pub const ORDER_ITEMS: &str = "lats_purchase_order_items";
  pub const SHIPPING: &str = "lats_shipping_info";
  pub const SHIPPING_EVENTS: &str = "lats_shipping_events";
  pub const AGENTS: &str = "lats_shipping_agents";
  pub const AGENTS_WITH_OFFICES: &str = "lats_shipping_agents_with_offices";
  pub const AGENT_OFFICES: &str = "lats_shipping_agent_offices";
  pub const SPARE_PARTS: &str = "lats_spare_parts";
  pub const SPARE_PART_USAGE: &str = "lats_spare_part_usage";
  pub const CARTS: &str = "lats_cart";
  pub const CART_ITEMS: &str = "lats_cart_items";
  pub const SALES: &str = "lats_sales";
  pub const SALE_ITEMS: &str = "lats_sale_items";
  pub const POS_SETTINGS: &str = "lats_pos_settings";
}

/// The public operation surface over a [`RemoteStore`].
pub struct DataProvider<S> {
  store:  ThrottledStore<S>,
  events: Arc<dyn EventSink>,
  config: ProviderConfig,
}

impl<S: RemoteStore> DataProvider<S> {
  /// A provider whose store calls are throttled per `config.throttle` and
  /// whose events go nowhere until [`DataProvider::with_events`] is called.
  pub fn new(store: S, config: ProviderConfig) -> Self {
    let throttler = Throttler::new(&config.throttle);
    Self {
      store: ThrottledStore::new(store, throttler),
      events: Arc::new(NullSink),
      config,
    }
  }

  pub fn with_throttler(mut self, throttler: Throttler) -> Self {
    self.store.set_throttler(throttler);
    self
  }

  pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
    self.events = events;
    self
  }

  pub fn config(&self) -> &ProviderConfig { &self.config }

  pub fn throttler(&self) -> &Throttler { self.store.throttler() }

  /// The unthrottled store underneath.
  pub fn store(&self) -> &S { self.store.inner() }

  // ─── Shared plumbing ──────────────────────────────────────────────────────

  fn authorize(&self, session: &Session) -> Result<()> {
    if session.is_authenticated() {
      Ok(())
    } else {
      Err(Error::Unauthenticated)
    }
  }

  /// Publish `topic` after a committed write. Never fails the caller.
  fn emit(&self, topic: &str, payload: impl Serialize) {
    match serde_json::to_value(payload) {
      Ok(payload) => self.events.emit(DomainEvent::new(topic, payload)),
      Err(e) => warn!(topic, error = %e, "dropping unserializable event"),
    }
  }

  /// Read one row by id.
  async fn fetch_row(&self, table: &'static str, id: Uuid, entity: &'static str) -> Result<Row> {
    let query = Select::all().filter(Filter::eq("id", id.to_string()));
    let rows = self.store.select(table, &query).await.remote("load record")?;
    rows.rows.into_iter().next().ok_or(Error::NotFound(entity))
  }

  /// Read one row by id, `None` when there is no such row.
  async fn find_row(&self, table: &'static str, id: Uuid, context: &'static str) -> Result<Option<Row>> {
    let query = Select::all().filter(Filter::eq("id", id.to_string()));
    let rows = self.store.select(table, &query).await.remote(context)?;
    Ok(rows.rows.into_iter().next())
  }

  /// Read every row of `table` whose `column` is one of `ids`.
  async fn fetch_in(
    &self,
    table: &'static str,
    column: &str,
    ids: impl IntoIterator<Item = Uuid>,
    context: &'static str,
  ) -> Result<Vec<Row>> {
    let mut ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let query = Select::all().filter(Filter::any_of(column, ids));
    Ok(self.store.select(table, &query).await.remote(context)?.rows)
  }

  /// Single-row writes for entities without dependents.
  async fn insert_one(&self, table: &'static str, row: Row, context: &'static str, entity: &'static str) -> Result<Row> {
    let rows = self.store.insert(table, vec![row]).await.remote(context)?;
    single(rows, entity)
  }

  /// Merge `patch` into row `id`. An empty patch only reads the row.
  async fn update_one(
    &self,
    table: &'static str,
    id: Uuid,
    patch: Row,
    context: &'static str,
    entity: &'static str,
  ) -> Result<Row> {
    if patch.is_empty() {
      return self.fetch_row(table, id, entity).await;
    }
    let filters = [Filter::eq("id", id.to_string())];
    let rows = self.store.update(table, patch, &filters).await.remote(context)?;
    single(rows, entity)
  }

  async fn delete_one(&self, table: &'static str, id: Uuid, context: &'static str, entity: &'static str) -> Result<()> {
    let filters = [Filter::eq("id", id.to_string())];
    match self.store.delete(table, &filters).await.remote(context)? {
      0 => Err(Error::NotFound(entity)),
      _ => Ok(()),
    }
  }

  /// Compensation that deletes the rows matching `filter`.
  fn delete_where(&self, table: &'static str, filter: Filter) -> Compensation<'_> {
    Box::pin(async move {
      let filters = [filter];
      self.store.delete(table, &filters).await.map(drop)
    })
  }

  /// Compensation that puts deleted rows back.
  fn reinsert(&self, table: &'static str, rows: Vec<Row>) -> Compensation<'_> {
    Box::pin(async move { self.store.insert(table, rows).await.map(drop) })
  }

  /// Compensation that writes `snapshot` back over the row `id`.
  fn restore(&self, table: &'static str, id: Uuid, snapshot: Row) -> Compensation<'_> {
    Box::pin(async move {
      let filters = [Filter::eq("id", id.to_string())];
      self.store.update(table, snapshot, &filters).await.map(drop)
    })
  }
}

/// The first row of a write result.
fn single(rows: Vec<Row>, entity: &'static str) -> Result<Row> {
  rows.into_iter().next().ok_or(Error::NotFound(entity))
}
