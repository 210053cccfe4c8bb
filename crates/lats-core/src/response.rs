//! The uniform envelope every public operation answers with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ ok: true, data }` on success, `{ ok: false, message, code? }` on
/// failure. `code` is only set for the small machine-checkable set of
/// conditions (insufficient stock, duplicate SKU, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
  pub ok:      bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details: Option<Value>,
}

impl<T> ApiResponse<T> {
  pub fn success(data: T) -> Self {
    Self { ok: true, data: Some(data), message: None, code: None, details: None }
  }

  pub fn failure(message: impl Into<String>) -> Self {
    Self {
      ok:      false,
      data:    None,
      message: Some(message.into()),
      code:    None,
      details: None,
    }
  }

  pub fn with_code(mut self, code: impl Into<String>) -> Self {
    self.code = Some(code.into());
    self
  }

  pub fn with_details(mut self, details: Value) -> Self {
    self.details = Some(details);
    self
  }
}

/// One page of a paginated list read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub data:        Vec<T>,
  pub total:       u64,
  pub page:        u64,
  pub limit:       u64,
  pub total_pages: u64,
}

impl<T> Page<T> {
  pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
    let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
    Self { data, total, page, limit, total_pages }
  }
}
