//! Purchase orders and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, catalog::Supplier, shipping::ShippingInfo};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Purchase-order lifecycle. Transitions only move forward:
/// `draft → sent → received`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
  Draft,
  Sent,
  Received,
}

impl OrderStatus {
  /// Parse a wire status, tolerating case differences.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .to_lowercase()
      .parse()
      .map_err(|_| Error::UnknownStatus(s.to_owned()))
  }

  /// Check that moving to `next` is the single forward step.
  pub fn transition(self, next: Self) -> Result<Self> {
    let allowed = matches!(
      (self, next),
      (Self::Draft, Self::Sent) | (Self::Sent, Self::Received)
    );
    if allowed {
      Ok(next)
    } else {
      Err(Error::InvalidTransition { from: self, to: next })
    }
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// The product a line item points at, resolved independently per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProduct {
  pub id:          Uuid,
  pub name:        String,
  pub sku:         String,
  pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemVariant {
  pub id:   Uuid,
  pub name: String,
  pub sku:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
  pub id:                Uuid,
  pub purchase_order_id: Uuid,
  pub product_id:        Option<Uuid>,
  pub variant_id:        Option<Uuid>,
  pub quantity:          i64,
  pub cost_price:        f64,
  pub total_price:       f64,
  pub received_quantity: i64,
  pub notes:             String,
  pub product:           Option<ItemProduct>,
  pub variant:           Option<ItemVariant>,
  pub created_at:        Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
  pub id:                         Uuid,
  pub order_number:               String,
  pub supplier_id:                Option<Uuid>,
  pub supplier:                   Option<Supplier>,
  /// The joined supplier's name, `"Unknown Supplier"` when it could not be
  /// resolved.
  pub supplier_name:              String,
  pub status:                     OrderStatus,
  pub currency:                   String,
  pub base_currency:              String,
  pub exchange_rate:              f64,
  pub exchange_rate_source:       String,
  pub exchange_rate_date:         Option<DateTime<Utc>>,
  pub total_amount:               f64,
  pub total_amount_base_currency: f64,
  pub expected_delivery:          String,
  pub payment_terms:              String,
  pub notes:                      String,
  pub tracking_number:            String,
  pub shipping_status:            String,
  pub created_by:                 String,
  pub items:                      Vec<PurchaseOrderItem>,
  pub shipping:                   Option<ShippingInfo>,
  pub created_at:                 Option<DateTime<Utc>>,
  pub updated_at:                 Option<DateTime<Utc>>,
}

// ─── Write model ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub variant_id: Uuid,
  pub quantity:   i64,
  pub cost_price: f64,
  #[serde(default)]
  pub notes:      Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPurchaseOrder {
  pub supplier_id:          String,
  pub expected_delivery:    Option<String>,
  pub payment_terms:        Option<String>,
  pub notes:                Option<String>,
  pub currency:             Option<String>,
  pub exchange_rate:        Option<f64>,
  pub exchange_rate_source: Option<String>,
  pub exchange_rate_date:   Option<DateTime<Utc>>,
  pub items:                Vec<NewOrderItem>,
}

/// Shallow partial update of an order's own columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseOrderUpdate {
  pub supplier_id:        Option<Uuid>,
  pub expected_delivery:  Option<String>,
  pub payment_terms:      Option<String>,
  pub notes:              Option<String>,
  pub status:             Option<OrderStatus>,
  pub tracking_number:    Option<String>,
  pub shipping_status:    Option<String>,
  pub estimated_delivery: Option<String>,
  pub shipping_notes:     Option<String>,
  pub shipping_date:      Option<String>,
  pub shipping_info:      Option<Value>,
}
