//! In-process event notifier.

use lats_core::event::{DomainEvent, EventSink};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Fan-out bus for [`DomainEvent`]s.
///
/// Every subscriber gets its own copy of each event. A subscriber that falls
/// more than `capacity` events behind loses the oldest ones; emitting never
/// waits on anyone.
#[derive(Clone)]
pub struct EventBus {
  sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> { self.sender.subscribe() }

  pub fn subscriber_count(&self) -> usize { self.sender.receiver_count() }
}

impl EventSink for EventBus {
  fn emit(&self, event: DomainEvent) {
    let name = event.name.clone();
    match self.sender.send(event) {
      Ok(receivers) => debug!(event = %name, receivers, "event published"),
      Err(_) => trace!(event = %name, "event published with no listeners"),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn subscribers_receive_events_in_order() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();

    bus.emit(DomainEvent::new("product.created", json!({ "id": 1 })));
    bus.emit(DomainEvent::new("stock.updated", json!({ "id": 1 })));

    assert_eq!(rx.recv().await.unwrap().name, "lats:product.created");
    assert_eq!(rx.recv().await.unwrap().topic(), "stock.updated");
  }

  #[test]
  fn emitting_without_listeners_is_silent() {
    let bus = EventBus::new(1);
    assert_eq!(bus.subscriber_count(), 0);
    bus.emit(DomainEvent::new("sale.created", json!(null)));
  }
}
