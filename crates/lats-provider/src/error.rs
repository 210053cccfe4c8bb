//! Error taxonomy for the data provider and its mapping to user-facing
//! responses.
//!
//! Validation failures are caught before any store call. Remote failures
//! carry the store's raw error, which is logged but never shown. Partial
//! failures of secondary reads and compensation failures never surface here;
//! they are logged where they happen.

use lats_core::{
  ApiResponse,
  purchase_order::OrderStatus,
  store::{StoreError, StoreErrorKind},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("invalid {field}: {value:?}")]
  InvalidId { field: &'static str, value: String },

  #[error("invalid {0} filter")]
  InvalidFilter(&'static str),

  #[error("duplicate SKUs in batch: {}", .0.join(", "))]
  DuplicateInBatch(Vec<String>),

  #[error("SKUs already exist: {}", .0.join(", "))]
  DuplicateInStore(Vec<String>),

  #[error("product name already exists: {0}")]
  DuplicateName(String),

  #[error("invalid quantity for {field}: {value}")]
  InvalidQuantity { field: &'static str, value: i64 },

  #[error("invalid price for {field}: {value}")]
  InvalidPrice { field: &'static str, value: f64 },

  #[error("cannot move from {from} to {to}")]
  InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

  #[error("order is {status}, not draft")]
  OrderLocked { status: OrderStatus },

  #[error("cart is empty")]
  EmptyCart,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("failed to {context}: {source}")]
  Remote {
    context: &'static str,
    #[source]
    source:  StoreError,
  },

  #[error("insufficient stock: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    variant_id: Option<Uuid>,
    requested:  i64,
    available:  i64,
  },

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("not authenticated")]
  Unauthenticated,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Attach an operation label to a raw store failure.
pub trait RemoteContext<T> {
  fn remote(self, context: &'static str) -> Result<T>;
}

impl<T> RemoteContext<T> for Result<T, StoreError> {
  fn remote(self, context: &'static str) -> Result<T> {
    self.map_err(|source| Error::Remote { context, source })
  }
}

impl Error {
  /// The store failure behind this error, if any.
  pub fn store_error(&self) -> Option<&StoreError> {
    match self {
      Self::Remote { source, .. } => Some(source),
      _ => None,
    }
  }

  /// Machine-checkable code for the few conditions callers branch on.
  pub fn code(&self) -> Option<&'static str> {
    match self {
      Self::InsufficientStock { .. } => Some("INSUFFICIENT_STOCK"),
      Self::NotFound(_) => Some("NOT_FOUND"),
      Self::Unauthenticated => Some("UNAUTHENTICATED"),
      Self::Validation(
        ValidationError::DuplicateInBatch(_) | ValidationError::DuplicateInStore(_),
      ) => Some("DUPLICATE_SKU"),
      Self::Validation(ValidationError::DuplicateName(_)) => Some("DUPLICATE_NAME"),
      Self::Validation(_) => Some("VALIDATION"),
      Self::Remote { .. } => None,
    }
  }

  /// Short human-readable message. Never includes raw store codes.
  pub fn user_message(&self) -> String {
    match self {
      Self::Validation(v) => validation_message(v),
      Self::Remote { context, source } => remote_message(context, source),
      Self::InsufficientStock { requested, available, .. } => format!(
        "Insufficient stock. Requested {requested}, but only {available} available."
      ),
      Self::NotFound(entity) => format!("{} not found.", capitalize(entity)),
      Self::Unauthenticated => "You must be signed in to perform this action.".to_owned(),
    }
  }

  /// Convert into the uniform failure envelope, logging what the user does
  /// not get to see.
  pub fn to_response<T>(&self) -> ApiResponse<T> {
    if let Self::Remote { context, source } = self {
      tracing::warn!(
        context,
        code = %source.code,
        details = source.details.as_deref().unwrap_or_default(),
        "store call failed: {}",
        source.message
      );
    }

    let mut response = ApiResponse::failure(self.user_message());
    if let Some(code) = self.code() {
      response = response.with_code(code);
    }
    if let Self::InsufficientStock { product_id, variant_id, requested, available } = self {
      response = response.with_details(json!({
        "productId":         product_id,
        "variantId":         variant_id,
        "requestedQuantity": requested,
        "availableQuantity": available,
      }));
    }
    response
  }
}

/// Wrap an operation outcome in the uniform envelope.
pub fn respond<T>(result: Result<T>) -> ApiResponse<T> {
  match result {
    Ok(data) => ApiResponse::success(data),
    Err(err) => err.to_response(),
  }
}

fn validation_message(err: &ValidationError) -> String {
  match err {
    ValidationError::MissingField(field) => format!("{} is required.", capitalize(field)),
    ValidationError::InvalidId { field, .. } => format!("Invalid {field} format."),
    ValidationError::InvalidFilter(field) => {
      format!("Invalid {field} format. Expected string, received object.")
    }
    ValidationError::DuplicateInBatch(skus) => format!(
      "Duplicate SKUs found within this product: {}. Each variant must have a unique SKU.",
      skus.join(", ")
    ),
    ValidationError::DuplicateInStore(skus) => format!(
      "The following SKUs already exist: {}. Please use different SKUs.",
      skus.join(", ")
    ),
    ValidationError::DuplicateName(name) => format!(
      "A product named \"{name}\" already exists. Please use a different name."
    ),
    ValidationError::InvalidQuantity { field, .. } => {
      format!("Invalid {field}: quantities must not be negative.")
    }
    ValidationError::InvalidPrice { field, .. } => {
      format!("Invalid {field}: prices must not be negative.")
    }
    ValidationError::InvalidStatusTransition { from, to } => {
      format!("Cannot change purchase order status from {from} to {to}.")
    }
    ValidationError::OrderLocked { status } => {
      format!("Only draft purchase orders can be changed this way; this order is {status}.")
    }
    ValidationError::EmptyCart => "Your cart is empty.".to_owned(),
  }
}

fn remote_message(context: &str, source: &StoreError) -> String {
  match source.kind {
    StoreErrorKind::PermissionDenied => {
      "You do not have permission to perform this action. Please check your access rights."
        .to_owned()
    }
    StoreErrorKind::UniqueViolation => {
      "A record with these details already exists.".to_owned()
    }
    StoreErrorKind::ForeignKeyViolation => {
      "One or more referenced records do not exist.".to_owned()
    }
    StoreErrorKind::NotFound => "The requested record was not found.".to_owned(),
    StoreErrorKind::InvalidInput => "The request contained invalid data.".to_owned(),
    StoreErrorKind::UndefinedTable | StoreErrorKind::UndefinedRelation => {
      "This feature is not available on the current database.".to_owned()
    }
    StoreErrorKind::Unavailable => {
      "The server is not reachable right now. Please try again shortly.".to_owned()
    }
    StoreErrorKind::Other => format!("Failed to {context}. Please try again."),
  }
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn remote_errors_hide_store_codes() {
    let err = Error::Remote {
      context: "create product variants",
      source:  StoreError::permission_denied("new row violates row-level security policy"),
    };
    let message = err.user_message();
    assert!(!message.contains("42501"));
    assert!(message.contains("permission"));
    assert_eq!(err.code(), None);
  }

  #[test]
  fn insufficient_stock_carries_code_and_details() {
    let product_id = Uuid::new_v4();
    let err = Error::InsufficientStock {
      product_id,
      variant_id: None,
      requested:  5,
      available:  2,
    };
    let resp: ApiResponse<()> = err.to_response();
    assert!(!resp.ok);
    assert_eq!(resp.code.as_deref(), Some("INSUFFICIENT_STOCK"));
    let details = resp.details.unwrap();
    assert_eq!(details["requestedQuantity"], 5);
    assert_eq!(details["availableQuantity"], 2);
  }

  #[test]
  fn duplicate_in_batch_names_the_sku() {
    let err = Error::from(ValidationError::DuplicateInBatch(vec!["W-1".into()]));
    assert!(err.user_message().contains("W-1"));
    assert_eq!(err.code(), Some("DUPLICATE_SKU"));
  }
}
