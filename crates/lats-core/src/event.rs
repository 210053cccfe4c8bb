//! Domain events published after successful mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel namespace prepended to every event name.
pub const NAMESPACE: &str = "lats";

/// A notification that an entity changed. `name` is namespaced, e.g.
/// `lats:product.created`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
  pub name:       String,
  pub payload:    Value,
  pub emitted_at: DateTime<Utc>,
}

impl DomainEvent {
  /// Build an event for `topic` (`"product.created"`, `"stock.updated"`, ...).
  pub fn new(topic: &str, payload: Value) -> Self {
    Self {
      name: format!("{NAMESPACE}:{topic}"),
      payload,
      emitted_at: Utc::now(),
    }
  }

  /// The event name without its namespace.
  pub fn topic(&self) -> &str {
    self
      .name
      .split_once(':')
      .map_or(self.name.as_str(), |(_, topic)| topic)
  }
}

/// A fire-and-forget event bus.
///
/// `emit` must not block and has no acknowledgement or delivery guarantee;
/// listeners that are slow or absent never hold up the caller.
pub trait EventSink: Send + Sync {
  fn emit(&self, event: DomainEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
  fn emit(&self, _event: DomainEvent) {}
}
