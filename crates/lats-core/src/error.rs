//! Error types for `lats-core`.

use thiserror::Error;

use crate::purchase_order::OrderStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown purchase order status: {0:?}")]
  UnknownStatus(String),

  #[error("cannot move a purchase order from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
