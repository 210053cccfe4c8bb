//! Shipping attachments on purchase orders, and the agents who carry them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingEvent {
  pub id:          Uuid,
  pub status:      String,
  pub description: String,
  pub location:    String,
  pub timestamp:   Option<DateTime<Utc>>,
}

/// The normalized shipping view of a purchase order.
///
/// Reconciled from a dedicated shipping record when one exists, otherwise
/// derived from the legacy flat fields on the order itself. A derived view has
/// `derived == true` and a synthesized `fallback-<order id>` identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
  pub id:                 String,
  pub purchase_order_id:  Uuid,
  pub carrier:            String,
  pub tracking_number:    String,
  pub status:             String,
  pub agent_id:           Option<Uuid>,
  pub estimated_delivery: String,
  pub shipped_date:       String,
  pub delivered_date:     String,
  pub cost:               f64,
  pub notes:              String,
  pub derived:            bool,
  pub events:             Vec<ShippingEvent>,
}

// ─── Agents ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOffice {
  pub id:       Uuid,
  pub agent_id: Uuid,
  pub name:     String,
  pub address:  String,
  pub city:     String,
  pub phone:    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAgent {
  pub id:                Uuid,
  pub name:              String,
  pub company:           String,
  pub phone:             String,
  pub email:             String,
  pub whatsapp:          String,
  pub supported_methods: Vec<String>,
  pub is_active:         bool,
  pub offices:           Vec<AgentOffice>,
  pub created_at:        Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeInput {
  pub name:    String,
  pub address: Option<String>,
  pub city:    Option<String>,
  pub phone:   Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAgentInput {
  pub name:              Option<String>,
  pub company:           Option<String>,
  pub phone:             Option<String>,
  pub email:             Option<String>,
  pub whatsapp:          Option<String>,
  pub supported_methods: Option<Vec<String>>,
  pub is_active:         Option<bool>,
  /// Offices to create with the agent; ignored on update.
  pub offices:           Vec<OfficeInput>,
}
