//! Products, their variants, and stock movements.
//!
//! A [`Product`] is the display envelope; every sellable unit is a
//! [`ProductVariant`] with its own globally unique SKU. A product always owns
//! at least one variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::catalog::{Category, Supplier};

// ─── Read model ──────────────────────────────────────────────────────────────

/// Display price for a product: a single number when every variant sells at
/// the same price, otherwise a `"min - max"` interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceDisplay {
  Single(f64),
  Range(String),
}

/// Where a product physically sits: shelf, storage room, and store location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfLocation {
  pub shelf_id:            Option<Uuid>,
  pub shelf_name:          String,
  pub shelf_code:          String,
  pub storage_room_name:   String,
  pub storage_room_code:   String,
  pub store_location_name: String,
  pub store_location_city: String,
  pub is_refrigerated:     bool,
  pub requires_ladder:     bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
  pub id:            Uuid,
  pub product_id:    Uuid,
  pub sku:           String,
  pub name:          String,
  pub cost_price:    f64,
  pub selling_price: f64,
  pub quantity:      i64,
  pub min_quantity:  i64,
  pub attributes:    Map<String, Value>,
  pub weight:        Option<f64>,
  pub dimensions:    Option<Value>,
  pub is_active:     bool,
  pub created_at:    Option<DateTime<Utc>>,
  pub updated_at:    Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id:              Uuid,
  pub name:            String,
  pub description:     String,
  pub sku:             String,
  pub category_id:     Option<Uuid>,
  pub supplier_id:     Option<Uuid>,
  pub shelf_id:        Option<Uuid>,
  pub category:        Option<Category>,
  pub supplier:        Option<Supplier>,
  pub location:        Option<ShelfLocation>,
  pub cost_price:      f64,
  pub selling_price:   f64,
  pub stock_quantity:  i64,
  pub min_stock_level: i64,
  pub total_quantity:  i64,
  pub total_value:     f64,
  pub condition:       String,
  pub is_active:       bool,
  pub tags:            Vec<String>,
  /// Image URLs, primary image first.
  pub images:          Vec<String>,
  pub attributes:      Map<String, Value>,
  pub metadata:        Map<String, Value>,
  pub variants:        Vec<ProductVariant>,
  pub display_price:   PriceDisplay,
  /// Lowest positive variant cost, or the product cost when there is none.
  pub display_cost:    f64,
  pub created_at:      Option<DateTime<Utc>>,
  pub updated_at:      Option<DateTime<Utc>>,
}

// ─── Write model ─────────────────────────────────────────────────────────────

/// A variant as supplied by the caller. `id` is only meaningful on update,
/// where it selects an existing variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewVariant {
  pub id:            Option<Uuid>,
  pub sku:           Option<String>,
  pub name:          Option<String>,
  pub cost_price:    Option<f64>,
  pub selling_price: Option<f64>,
  pub quantity:      Option<i64>,
  pub min_quantity:  Option<i64>,
  pub attributes:    Option<Map<String, Value>>,
  pub weight:        Option<f64>,
  pub dimensions:    Option<Value>,
}

/// Payload for product creation.
///
/// Foreign keys arrive as raw strings so that a malformed id can be reported
/// as a validation failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
  pub name:            String,
  pub description:     Option<String>,
  pub sku:             Option<String>,
  pub category_id:     Option<String>,
  pub supplier_id:     Option<String>,
  pub shelf_id:        Option<String>,
  pub cost_price:      Option<f64>,
  pub selling_price:   Option<f64>,
  pub stock_quantity:  Option<i64>,
  pub min_stock_level: Option<i64>,
  pub condition:       Option<String>,
  pub is_active:       Option<bool>,
  pub tags:            Vec<String>,
  pub images:          Vec<String>,
  pub attributes:      Option<Map<String, Value>>,
  pub metadata:        Option<Map<String, Value>>,
  pub variants:        Vec<NewVariant>,
}

/// Partial product update; only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
  pub name:            Option<String>,
  pub description:     Option<String>,
  pub sku:             Option<String>,
  pub category_id:     Option<String>,
  pub supplier_id:     Option<String>,
  pub shelf_id:        Option<String>,
  pub cost_price:      Option<f64>,
  pub selling_price:   Option<f64>,
  pub min_stock_level: Option<i64>,
  pub condition:       Option<String>,
  pub is_active:       Option<bool>,
  pub tags:            Option<Vec<String>>,
  pub images:          Option<Vec<String>>,
  pub attributes:      Option<Map<String, Value>>,
  pub metadata:        Option<Map<String, Value>>,
  /// Variants to upsert: entries with an `id` update that variant, entries
  /// without one are inserted. Variants not listed are left untouched.
  pub variants:        Option<Vec<NewVariant>>,
}

/// List filters for the products page.
///
/// `category_id` and `supplier_id` are kept as raw JSON so that a caller
/// passing an object instead of an id string is rejected explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilters {
  pub page:        Option<u64>,
  pub limit:       Option<u64>,
  pub category_id: Option<Value>,
  pub supplier_id: Option<Value>,
  pub is_active:   Option<bool>,
}

// ─── Stock movements ─────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MovementType {
  In,
  Out,
  Adjustment,
}

/// An append-only record of one stock change on a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
  pub id:                Uuid,
  pub product_id:        Uuid,
  pub variant_id:        Uuid,
  pub movement_type:     MovementType,
  pub quantity:          i64,
  pub previous_quantity: i64,
  pub new_quantity:      i64,
  pub reason:            String,
  pub reference:         String,
  pub created_by:        String,
  pub created_at:        Option<DateTime<Utc>>,
}

/// A signed stock change against one variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
  pub variant_id: Uuid,
  pub delta:      i64,
  #[serde(default)]
  pub reason:     String,
  #[serde(default)]
  pub reference:  Option<String>,
}
