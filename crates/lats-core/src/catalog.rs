//! Reference entities joined into product and purchase-order views, plus
//! the brand list the catalog forms pick from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Supplier ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
  pub id:             Uuid,
  pub name:           String,
  pub contact_person: String,
  pub email:          String,
  pub phone:          String,
  pub address:        String,
  pub website:        String,
  pub notes:          String,
  pub is_active:      bool,
  pub created_at:     Option<DateTime<Utc>>,
  pub updated_at:     Option<DateTime<Utc>>,
}

/// Create or partial-update payload for a supplier. On create, `name` is
/// required and omitted strings become `""`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierInput {
  pub name:           Option<String>,
  pub contact_person: Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  pub address:        Option<String>,
  pub website:        Option<String>,
  pub notes:          Option<String>,
  pub is_active:      Option<bool>,
}

// ─── Category ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id:          Uuid,
  pub name:        String,
  pub description: String,
  pub color:       String,
  pub parent_id:   Option<Uuid>,
  pub is_active:   bool,
  pub created_at:  Option<DateTime<Utc>>,
  pub updated_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryInput {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub color:       Option<String>,
  pub parent_id:   Option<Uuid>,
  pub is_active:   Option<bool>,
}

// ─── Brand ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
  pub id:          Uuid,
  pub name:        String,
  pub description: String,
  pub logo_url:    String,
  /// Free-form grouping such as `"phone"` or `"accessory"`.
  pub category:    String,
  pub is_active:   bool,
  pub created_at:  Option<DateTime<Utc>>,
  pub updated_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandInput {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub logo_url:    Option<String>,
  pub category:    Option<String>,
  pub is_active:   Option<bool>,
}
