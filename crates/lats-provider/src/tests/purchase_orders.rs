use lats_core::{
  catalog::SupplierInput,
  purchase_order::{NewOrderItem, NewPurchaseOrder, OrderStatus, PurchaseOrderUpdate},
  store::{RemoteStore, StoreError},
};
use serde_json::json;
use uuid::Uuid;

use super::support::{Fixture, Op, count, fixture, product, session, variant};
use crate::{Error, ValidationError, normalize::into_row, table};

struct Stocked {
  supplier_id: Uuid,
  product_id:  Uuid,
  variant_id:  Uuid,
}

async fn stocked(fx: &Fixture) -> Stocked {
  let supplier = fx
    .provider
    .create_supplier(&session(), SupplierInput { name: Some("Acme".into()), ..Default::default() })
    .await
    .unwrap();
  let product = fx
    .provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 0, 5.0, 9.0)]))
    .await
    .unwrap();
  Stocked {
    supplier_id: supplier.id,
    product_id:  product.id,
    variant_id:  product.variants[0].id,
  }
}

fn order(s: &Stocked, lines: &[(i64, f64)]) -> NewPurchaseOrder {
  NewPurchaseOrder {
    supplier_id: s.supplier_id.to_string(),
    items: lines
      .iter()
      .map(|&(quantity, cost_price)| NewOrderItem {
        product_id: s.product_id,
        variant_id: s.variant_id,
        quantity,
        cost_price,
        notes: None,
      })
      .collect(),
    ..Default::default()
  }
}

#[tokio::test]
async fn foreign_currency_totals_are_converted() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let mut input = order(&s, &[(2, 100.0), (3, 50.0)]);
  input.currency      = Some("usd".into());
  input.exchange_rate = Some(2500.0);

  let created = fx.provider.create_purchase_order(&session(), input).await.unwrap();

  assert_eq!(created.status, OrderStatus::Draft);
  assert_eq!(created.currency, "USD");
  assert_eq!(created.exchange_rate_source, "manual");
  assert_eq!(created.items.len(), 2);
  assert_eq!(created.total_amount, 350.0);
  assert_eq!(created.total_amount_base_currency, 875_000.0);
  assert!(created.order_number.starts_with("PO-"));
  assert!(fx.events.topics().contains(&"purchase-order.created".to_owned()));
}

#[tokio::test]
async fn base_currency_totals_are_not_converted() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let mut input = order(&s, &[(4, 25.0)]);
  input.exchange_rate = Some(2500.0);

  let created = fx.provider.create_purchase_order(&session(), input).await.unwrap();
  assert_eq!(created.currency, created.base_currency);
  assert_eq!(created.total_amount, 100.0);
  assert_eq!(created.total_amount_base_currency, 100.0);
}

#[tokio::test]
async fn failed_items_leave_no_order_behind() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  fx.store()
    .fail(Op::Insert, table::ORDER_ITEMS, StoreError::unavailable("connection reset"));

  let err = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0)]))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Remote { .. }));
  assert_eq!(count(fx.store(), table::ORDERS, None).await, 0);
  assert!(!fx.events.topics().contains(&"purchase-order.created".to_owned()));
}

#[tokio::test]
async fn failed_totals_remove_order_and_items() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  fx.store()
    .fail(Op::Update, table::ORDERS, StoreError::permission_denied("row-level security"));

  fx.provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0)]))
    .await
    .unwrap_err();

  assert_eq!(count(fx.store(), table::ORDERS, None).await, 0);
  assert_eq!(count(fx.store(), table::ORDER_ITEMS, None).await, 0);
}

#[tokio::test]
async fn detail_derives_shipping_when_the_table_is_missing() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0)]))
    .await
    .unwrap();
  let update = PurchaseOrderUpdate {
    tracking_number: Some("DHL1234567".into()),
    shipping_status: Some("in_transit".into()),
    ..Default::default()
  };
  fx.provider
    .update_purchase_order(&session(), created.id, update)
    .await
    .unwrap();

  fx.store()
    .fail(Op::Select, table::SHIPPING, StoreError::undefined_table(table::SHIPPING));
  let detail = fx
    .provider
    .get_purchase_order(&created.id.to_string())
    .await
    .unwrap();

  let shipping = detail.shipping.unwrap();
  assert_eq!(shipping.id, format!("fallback-{}", created.id));
  assert!(shipping.derived);
  assert_eq!(shipping.carrier, "DHL Express");
  assert_eq!(shipping.status, "in_transit");
  assert_eq!(detail.items.len(), 1);
  assert_eq!(detail.items[0].product.as_ref().unwrap().name, "Widget");
}

#[tokio::test]
async fn detail_prefers_the_dedicated_shipping_record() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0)]))
    .await
    .unwrap();

  let shipping_id = Uuid::new_v4();
  let store = fx.store().inner();
  store
    .insert(
      table::SHIPPING,
      vec![into_row(json!({
        "id": shipping_id.to_string(),
        "purchase_order_id": created.id.to_string(),
        "tracking_number": "DHL999",
        "status": "shipped",
      }))],
    )
    .await
    .unwrap();
  store
    .insert(
      table::SHIPPING_EVENTS,
      vec![into_row(json!({
        "shipping_id": shipping_id.to_string(),
        "status": "picked_up",
        "location": "Dar es Salaam",
      }))],
    )
    .await
    .unwrap();

  let detail = fx
    .provider
    .get_purchase_order(&created.id.to_string())
    .await
    .unwrap();
  let shipping = detail.shipping.unwrap();
  assert_eq!(shipping.id, shipping_id.to_string());
  assert!(!shipping.derived);
  assert_eq!(shipping.carrier, "DHL Express");
  assert_eq!(shipping.events.len(), 1);
  assert_eq!(shipping.events[0].location, "Dar es Salaam");
}

#[tokio::test]
async fn detail_survives_a_failed_supplier_read() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0)]))
    .await
    .unwrap();

  fx.store()
    .fail(Op::Select, table::SUPPLIERS, StoreError::unavailable("timeout"));
  let detail = fx
    .provider
    .get_purchase_order(&created.id.to_string())
    .await
    .unwrap();

  assert!(detail.supplier.is_none());
  assert_eq!(detail.supplier_name, "Unknown Supplier");
  assert_eq!(detail.items.len(), 1);
  assert!(detail.shipping.is_none());
}

#[tokio::test]
async fn list_survives_a_missing_items_relation() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  fx.provider
    .create_purchase_order(&session(), order(&s, &[(2, 10.0)]))
    .await
    .unwrap();

  fx.store().fail_embed(
    table::ORDERS,
    table::ORDER_ITEMS,
    StoreError::undefined_relation(table::ORDERS, table::ORDER_ITEMS),
  );
  let orders = fx.provider.get_purchase_orders().await.unwrap();
  assert_eq!(orders.len(), 1);
  assert_eq!(orders[0].items.len(), 1);
  assert_eq!(orders[0].supplier_name, "Acme");
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_any_read() {
  let fx = fixture().await;
  let err = fx.provider.get_purchase_order("PO-42").await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::InvalidId { .. })));
  assert_eq!(fx.store().calls(Op::Select, table::ORDERS), 0);

  let err = fx
    .provider
    .get_purchase_order(&Uuid::new_v4().to_string())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn orders_move_through_their_lifecycle() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(2, 10.0), (1, 4.0)]))
    .await
    .unwrap();

  let err = fx
    .provider
    .receive_purchase_order(&session(), created.id)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ValidationError::InvalidStatusTransition {
      from: OrderStatus::Draft,
      to:   OrderStatus::Received,
    })
  ));

  let sent = fx.provider.send_purchase_order(&session(), created.id).await.unwrap();
  assert_eq!(sent.status, OrderStatus::Sent);

  let err = fx
    .provider
    .delete_purchase_order(&session(), created.id)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ValidationError::OrderLocked { status: OrderStatus::Sent })
  ));

  let received = fx
    .provider
    .receive_purchase_order(&session(), created.id)
    .await
    .unwrap();
  assert_eq!(received.status, OrderStatus::Received);
  assert!(received.items.iter().all(|i| i.received_quantity == i.quantity));

  let update = PurchaseOrderUpdate { status: Some(OrderStatus::Draft), ..Default::default() };
  assert!(fx.provider.update_purchase_order(&session(), created.id, update).await.is_err());
}

#[tokio::test]
async fn receiving_through_an_update_records_item_receipts() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(3, 10.0), (2, 4.0)]))
    .await
    .unwrap();
  fx.provider.send_purchase_order(&session(), created.id).await.unwrap();

  let update = PurchaseOrderUpdate {
    status: Some(OrderStatus::Received),
    notes:  Some("arrived complete".into()),
    ..Default::default()
  };
  let received = fx
    .provider
    .update_purchase_order(&session(), created.id, update)
    .await
    .unwrap();
  assert_eq!(received.status, OrderStatus::Received);
  assert_eq!(received.notes, "arrived complete");

  let detail = fx.provider.get_purchase_order(&created.id.to_string()).await.unwrap();
  assert_eq!(detail.items.len(), 2);
  assert!(detail.items.iter().all(|i| i.received_quantity == i.quantity));
  assert!(fx.events.topics().contains(&"purchase-order.received".to_owned()));
}

#[tokio::test]
async fn drafts_are_deleted_with_their_items() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0)]))
    .await
    .unwrap();

  fx.provider.delete_purchase_order(&session(), created.id).await.unwrap();

  assert_eq!(count(fx.store(), table::ORDERS, None).await, 0);
  assert_eq!(count(fx.store(), table::ORDER_ITEMS, None).await, 0);
  assert!(fx.events.topics().contains(&"purchase-order.deleted".to_owned()));
}

#[tokio::test]
async fn failed_order_delete_restores_the_items() {
  let fx = fixture().await;
  let s  = stocked(&fx).await;
  let created = fx
    .provider
    .create_purchase_order(&session(), order(&s, &[(1, 10.0), (2, 3.0)]))
    .await
    .unwrap();

  fx.store()
    .fail(Op::Delete, table::ORDERS, StoreError::permission_denied("row-level security"));
  fx.provider
    .delete_purchase_order(&session(), created.id)
    .await
    .unwrap_err();

  assert_eq!(count(fx.store(), table::ORDERS, None).await, 1);
  assert_eq!(count(fx.store(), table::ORDER_ITEMS, None).await, 2);
}
