//! Spare parts consumed by repairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparePart {
  pub id:            Uuid,
  pub name:          String,
  pub part_number:   String,
  pub category_id:   Option<Uuid>,
  pub supplier_id:   Option<Uuid>,
  pub condition:     String,
  pub description:   String,
  pub cost_price:    f64,
  pub selling_price: f64,
  pub quantity:      i64,
  pub min_quantity:  i64,
  pub location:      String,
  pub is_active:     bool,
  pub created_at:    Option<DateTime<Utc>>,
  pub updated_at:    Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SparePartInput {
  pub name:          Option<String>,
  pub part_number:   Option<String>,
  pub category_id:   Option<Uuid>,
  pub supplier_id:   Option<Uuid>,
  pub condition:     Option<String>,
  pub description:   Option<String>,
  pub cost_price:    Option<f64>,
  pub selling_price: Option<f64>,
  pub quantity:      Option<i64>,
  pub min_quantity:  Option<i64>,
  pub location:      Option<String>,
  pub is_active:     Option<bool>,
}

/// One withdrawal of stock from a spare part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparePartUsage {
  pub id:            Uuid,
  pub spare_part_id: Uuid,
  pub quantity:      i64,
  pub reason:        String,
  pub notes:         String,
  pub used_by:       String,
  pub used_at:       Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRequest {
  pub quantity: i64,
  #[serde(default)]
  pub reason:   String,
  #[serde(default)]
  pub notes:    Option<String>,
}
