//! Purchase orders, their line items, and shipping attachments.

use chrono::{DateTime, Utc};
use lats_core::{
  purchase_order::{
    ItemProduct, ItemVariant, NewOrderItem, OrderStatus, PurchaseOrder, PurchaseOrderItem,
    PurchaseOrderUpdate,
  },
  shipping::{ShippingEvent, ShippingInfo},
  store::Row,
};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Fields, blank_to_null, into_row, put_opt, supplier};

// ─── Readers ─────────────────────────────────────────────────────────────────

fn item_product(row: &Row) -> ItemProduct {
  let f = Fields::new(row);
  ItemProduct {
    id:          f.id(),
    name:        f.text("name"),
    sku:         f.text("sku"),
    category_id: f.uuid("category_id"),
  }
}

fn item_variant(row: &Row) -> ItemVariant {
  let f = Fields::new(row);
  ItemVariant { id: f.id(), name: f.text("name"), sku: f.text("sku") }
}

pub fn order_item(row: &Row) -> PurchaseOrderItem {
  let f = Fields::new(row);
  let quantity   = f.integer("quantity");
  let cost_price = f.number("cost_price");
  PurchaseOrderItem {
    id:                f.id(),
    purchase_order_id: f.uuid("purchase_order_id").unwrap_or_default(),
    product_id:        f.uuid("product_id"),
    variant_id:        f.uuid("variant_id"),
    quantity,
    cost_price,
    total_price:       f
      .opt_number("total_price")
      .unwrap_or(quantity as f64 * cost_price),
    received_quantity: f.integer("received_quantity").clamp(0, quantity.max(0)),
    notes:             f.text("notes"),
    product:           f.nested("product").map(item_product),
    variant:           f.nested("variant").map(item_variant),
    created_at:        f.datetime("created_at"),
  }
}

pub fn purchase_order(row: &Row) -> PurchaseOrder {
  let f = Fields::new(row);
  let total_amount  = f.number("total_amount");
  let currency      = f.opt_text("currency").unwrap_or_else(|| "TZS".to_owned());
  let supplier      = f.nested("supplier").map(supplier);
  let supplier_name = supplier
    .as_ref()
    .map(|s| s.name.clone())
    .or_else(|| f.opt_text("supplier_name"))
    .filter(|name| !name.trim().is_empty())
    .unwrap_or_else(|| "Unknown Supplier".to_owned());

  PurchaseOrder {
    id:                         f.id(),
    order_number:               f.text("order_number"),
    supplier_id:                f.uuid("supplier_id"),
    supplier,
    supplier_name,
    status:                     f
      .opt_text("status")
      .and_then(|s| OrderStatus::parse(&s).ok())
      .unwrap_or(OrderStatus::Draft),
    base_currency:              f.opt_text("base_currency").unwrap_or_else(|| currency.clone()),
    currency,
    exchange_rate:              f.opt_number("exchange_rate").unwrap_or(1.0),
    exchange_rate_source:       f
      .opt_text("exchange_rate_source")
      .unwrap_or_else(|| "default".to_owned()),
    exchange_rate_date:         f
      .datetime("exchange_rate_date")
      .or_else(|| f.datetime("created_at")),
    total_amount,
    total_amount_base_currency: f
      .opt_number("total_amount_base_currency")
      .unwrap_or(total_amount),
    expected_delivery:          f.text("expected_delivery"),
    payment_terms:              f.text("payment_terms"),
    notes:                      f.text("notes"),
    tracking_number:            f.text("tracking_number"),
    shipping_status:            f.text("shipping_status"),
    created_by:                 f.text("created_by"),
    items:                      f.rows("items").map(order_item).collect(),
    shipping:                   f.nested("shipping").map(shipping_record),
    created_at:                 f.datetime("created_at"),
    updated_at:                 f.datetime("updated_at"),
  }
}

pub fn shipping_event(row: &Row) -> ShippingEvent {
  let f = Fields::new(row);
  ShippingEvent {
    id:          f.id(),
    status:      f.text("status"),
    description: f.text("description"),
    location:    f.text("location"),
    timestamp:   f.datetime("timestamp").or_else(|| f.datetime("created_at")),
  }
}

/// A dedicated shipping record, with its events embedded under `events`.
pub fn shipping_record(row: &Row) -> ShippingInfo {
  let f = Fields::new(row);
  let tracking_number = f.text("tracking_number");
  ShippingInfo {
    id:                 f.opt_text("id").unwrap_or_default(),
    purchase_order_id:  f.uuid("purchase_order_id").unwrap_or_default(),
    carrier:            f
      .opt_text("carrier")
      .filter(|c| !c.trim().is_empty())
      .unwrap_or_else(|| carrier_for(&tracking_number).to_owned()),
    tracking_number,
    status:             f.opt_text("status").unwrap_or_else(|| "pending".to_owned()),
    agent_id:           f.uuid("agent_id"),
    estimated_delivery: f.text("estimated_delivery"),
    shipped_date:       f.text("shipped_date"),
    delivered_date:     f.text("delivered_date"),
    cost:               f.number("cost"),
    notes:              f.text("notes"),
    derived:            f.bool_or("derived", false),
    events:             f.rows("events").map(shipping_event).collect(),
  }
}

// ─── Legacy reconciliation ───────────────────────────────────────────────────

/// Tracking-number prefixes of the carriers the shop works with.
const CARRIERS: &[(&str, &str)] = &[
  ("DHL", "DHL Express"),
  ("FEDEX", "FedEx"),
  ("UPS", "UPS"),
  ("MAERSK", "Maersk Line"),
  ("TED", "Tanzania Express Delivery"),
];

/// Infer a carrier name from a tracking number.
pub fn carrier_for(tracking_number: &str) -> &'static str {
  let upper = tracking_number.trim().to_uppercase();
  CARRIERS
    .iter()
    .find(|(prefix, _)| upper.starts_with(*prefix))
    .map_or("Unknown Carrier", |(_, name)| *name)
}

/// Best-effort shipping view built from the flat fields an order row carried
/// before shipping got its own table. `None` when the order has no shipping
/// data at all.
pub fn legacy_shipping(order: &Row) -> Option<ShippingInfo> {
  let f    = Fields::new(order);
  let blob = f.nested("shipping_info");
  let b    = blob.map(Fields::new);
  let pick = |key: &str| {
    f.opt_text(key)
      .filter(|s| !s.trim().is_empty())
      .or_else(|| b.and_then(|b| b.opt_text(key)).filter(|s| !s.trim().is_empty()))
  };

  let tracking_number = pick("tracking_number");
  let status          = pick("shipping_status").or_else(|| b.and_then(|b| b.opt_text("status")));
  if tracking_number.is_none() && status.is_none() && blob.is_none() {
    return None;
  }

  let order_id        = f.id();
  let tracking_number = tracking_number.unwrap_or_default();
  Some(ShippingInfo {
    id:                 format!("fallback-{order_id}"),
    purchase_order_id:  order_id,
    carrier:            pick("carrier").unwrap_or_else(|| carrier_for(&tracking_number).to_owned()),
    tracking_number,
    status:             status.unwrap_or_else(|| "pending".to_owned()),
    agent_id:           b.and_then(|b| b.uuid("agent_id")),
    estimated_delivery: pick("estimated_delivery")
      .or_else(|| pick("expected_delivery"))
      .unwrap_or_default(),
    shipped_date:       pick("shipping_date").or_else(|| pick("shipped_date")).unwrap_or_default(),
    delivered_date:     pick("delivered_date").unwrap_or_default(),
    cost:               b.map_or(0.0, |b| b.number("cost")),
    notes:              pick("shipping_notes").unwrap_or_default(),
    derived:            true,
    events:             Vec::new(),
  })
}

// ─── Writers ─────────────────────────────────────────────────────────────────

/// Resolved currency snapshot for a new order.
#[derive(Debug, Clone)]
pub struct CurrencySnapshot {
  pub currency:      String,
  pub base_currency: String,
  pub exchange_rate: f64,
  pub source:        String,
  pub date:          DateTime<Utc>,
}

impl CurrencySnapshot {
  /// `amount` expressed in the base currency.
  pub fn to_base(&self, amount: f64) -> f64 {
    if self.currency.eq_ignore_ascii_case(&self.base_currency) {
      amount
    } else {
      amount * self.exchange_rate
    }
  }
}

pub struct NewOrderRow<'a> {
  pub id:           Uuid,
  pub order_number: &'a str,
  pub supplier_id:  Uuid,
  pub currency:     &'a CurrencySnapshot,
  pub created_by:   &'a str,
}

/// The parent row, always written as a draft with zero totals.
pub fn order_row(
  o: &NewOrderRow<'_>,
  expected_delivery: Option<&str>,
  payment_terms: Option<&str>,
  notes: Option<&str>,
) -> Row {
  into_row(json!({
    "id":                         o.id.to_string(),
    "order_number":               o.order_number,
    "supplier_id":                o.supplier_id.to_string(),
    "status":                     OrderStatus::Draft.as_ref(),
    "currency":                   o.currency.currency,
    "base_currency":              o.currency.base_currency,
    "exchange_rate":              o.currency.exchange_rate,
    "exchange_rate_source":       o.currency.source,
    "exchange_rate_date":         o.currency.date.to_rfc3339(),
    "total_amount":               0.0,
    "total_amount_base_currency": 0.0,
    "expected_delivery":          blank_to_null(expected_delivery),
    "payment_terms":              payment_terms.unwrap_or_default(),
    "notes":                      notes.unwrap_or_default(),
    "created_by":                 o.created_by,
  }))
}

pub fn order_item_row(order_id: Uuid, item: &NewOrderItem) -> Row {
  into_row(json!({
    "purchase_order_id": order_id.to_string(),
    "product_id":        item.product_id.to_string(),
    "variant_id":        item.variant_id.to_string(),
    "quantity":          item.quantity,
    "cost_price":        item.cost_price,
    "total_price":       item.quantity as f64 * item.cost_price,
    "received_quantity": 0,
    "notes":             item.notes.clone().unwrap_or_default(),
  }))
}

/// Database-shape partial row: only the keys the caller set.
pub fn order_patch(update: &PurchaseOrderUpdate) -> Row {
  let mut row = Row::new();
  put_opt(&mut row, "supplier_id", update.supplier_id.map(|id| id.to_string()));
  if let Some(expected) = &update.expected_delivery {
    row.insert("expected_delivery".to_owned(), blank_to_null(Some(expected.as_str())));
  }
  put_opt(&mut row, "payment_terms", update.payment_terms.clone());
  put_opt(&mut row, "notes", update.notes.clone());
  put_opt(&mut row, "status", update.status.map(|s| s.as_ref().to_owned()));
  put_opt(&mut row, "tracking_number", update.tracking_number.clone());
  put_opt(&mut row, "shipping_status", update.shipping_status.clone());
  if let Some(estimated) = &update.estimated_delivery {
    row.insert("estimated_delivery".to_owned(), blank_to_null(Some(estimated.as_str())));
  }
  put_opt(&mut row, "shipping_notes", update.shipping_notes.clone());
  if let Some(date) = &update.shipping_date {
    row.insert("shipping_date".to_owned(), blank_to_null(Some(date.as_str())));
  }
  if let Some(info) = &update.shipping_info {
    row.insert("shipping_info".to_owned(), info.clone());
  }
  row
}

/// Totals patch written once the items are in.
pub fn totals_patch(total: f64, snapshot: &CurrencySnapshot) -> Row {
  let mut row = Row::new();
  row.insert("total_amount".to_owned(), Value::from(total));
  row.insert(
    "total_amount_base_currency".to_owned(),
    Value::from(snapshot.to_base(total)),
  );
  row
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn carrier_prefixes() {
    assert_eq!(carrier_for("dhl123"), "DHL Express");
    assert_eq!(carrier_for("FEDEX-9"), "FedEx");
    assert_eq!(carrier_for("TED0042"), "Tanzania Express Delivery");
    assert_eq!(carrier_for("XYZ"), "Unknown Carrier");
    assert_eq!(carrier_for(""), "Unknown Carrier");
  }

  #[test]
  fn legacy_fields_become_derived_shipping() {
    let id  = Uuid::new_v4();
    let row = into_row(json!({
      "id": id.to_string(),
      "tracking_number": "MAERSK77",
      "shipping_notes": "fragile",
    }));
    let info = legacy_shipping(&row).unwrap();
    assert_eq!(info.id, format!("fallback-{id}"));
    assert_eq!(info.carrier, "Maersk Line");
    assert_eq!(info.status, "pending");
    assert_eq!(info.notes, "fragile");
    assert!(info.derived);
  }

  #[test]
  fn order_without_shipping_data_has_none() {
    let row = into_row(json!({ "id": Uuid::new_v4().to_string(), "tracking_number": "" }));
    assert!(legacy_shipping(&row).is_none());
  }

  #[test]
  fn base_total_uses_rate_only_across_currencies() {
    let snapshot = |currency: &str| CurrencySnapshot {
      currency:      currency.to_owned(),
      base_currency: "TZS".to_owned(),
      exchange_rate: 2500.0,
      source:        "manual".to_owned(),
      date:          Utc::now(),
    };
    assert_eq!(snapshot("USD").to_base(350.0), 875_000.0);
    assert_eq!(snapshot("TZS").to_base(350.0), 350.0);
  }

  #[test]
  fn purchase_order_is_idempotent_under_renormalization() {
    let order_id = Uuid::new_v4();
    let row = into_row(json!({
      "id": order_id.to_string(),
      "order_number": "PO-20250101-abc123",
      "status": "SENT",
      "currency": "USD",
      "base_currency": "TZS",
      "exchange_rate": 2500,
      "total_amount": "350",
      "created_at": "2025-01-01T00:00:00Z",
      "items": [
        { "id": Uuid::new_v4().to_string(), "purchase_order_id": order_id.to_string(),
          "quantity": 2, "cost_price": 100, "received_quantity": 5,
          "product": { "id": Uuid::new_v4().to_string(), "name": "Widget" } }
      ],
      "shipping": {
        "id": format!("fallback-{order_id}"),
        "purchase_order_id": order_id.to_string(),
        "tracking_number": "UPS1",
        "derived": true
      }
    }));

    let once  = purchase_order(&row);
    let again = purchase_order(&into_row(serde_json::to_value(&once).unwrap()));
    assert_eq!(once, again);
    assert_eq!(once.status, OrderStatus::Sent);
    assert_eq!(once.items[0].total_price, 200.0);
    assert_eq!(once.items[0].received_quantity, 2);
    assert_eq!(once.total_amount_base_currency, 350.0);
    assert_eq!(once.shipping.as_ref().unwrap().carrier, "UPS");
    assert_eq!(once.exchange_rate_date, once.created_at);
  }
}
