//! Point-of-sale cart and completed sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id:           Uuid,
  pub cart_id:      Uuid,
  pub product_id:   Uuid,
  pub variant_id:   Uuid,
  pub product_name: String,
  pub sku:          String,
  pub quantity:     i64,
  pub unit_price:   f64,
  pub total_price:  f64,
}

/// A user's open cart. An absent cart reads as an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub id:          Option<Uuid>,
  pub user_id:     String,
  pub items:       Vec<CartItem>,
  pub total:       f64,
  pub total_items: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
  pub product_id: Uuid,
  pub variant_id: Uuid,
  pub quantity:   i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
  pub id:          Uuid,
  pub sale_id:     Uuid,
  pub product_id:  Uuid,
  pub variant_id:  Uuid,
  pub sku:         String,
  pub quantity:    i64,
  pub unit_price:  f64,
  pub total_price: f64,
  pub created_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
  pub id:             Uuid,
  pub sale_number:    String,
  pub customer_id:    Option<Uuid>,
  pub total_amount:   f64,
  pub payment_method: String,
  pub status:         String,
  pub notes:          String,
  pub created_by:     String,
  pub items:          Vec<SaleItem>,
  pub created_at:     Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleRequest {
  pub customer_id:    Option<Uuid>,
  pub payment_method: String,
  pub notes:          Option<String>,
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// Till settings shared by every point-of-sale session. There is at most one
/// stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosSettings {
  pub id:                     Uuid,
  pub tax_rate:               f64,
  pub currency:               String,
  pub default_payment_method: String,
  pub receipt_header:         String,
  pub receipt_footer:         String,
  pub auto_print:             bool,
  pub low_stock_alert:        bool,
  pub stock_threshold:        i64,
  pub updated_at:             Option<DateTime<Utc>>,
}

/// Partial settings; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosSettingsUpdate {
  pub tax_rate:               Option<f64>,
  pub currency:               Option<String>,
  pub default_payment_method: Option<String>,
  pub receipt_header:         Option<String>,
  pub receipt_footer:         Option<String>,
  pub auto_print:             Option<bool>,
  pub low_stock_alert:        Option<bool>,
  pub stock_threshold:        Option<i64>,
}
