//! Route handlers. Each one answers with the uniform envelope.

pub mod agents;
pub mod catalog;
pub mod products;
pub mod purchase_orders;
pub mod sales;
pub mod spare_parts;

use std::future::Future;

use axum::{Json, http::StatusCode};
use lats_core::ApiResponse;
use lats_provider::{Result, respond, validate};
use uuid::Uuid;

pub type Reply<T> = Json<ApiResponse<T>>;

pub fn reply<T>(result: Result<T>) -> Reply<T> { Json(respond(result)) }

/// `201` for a successful create, `200` with the failure envelope otherwise.
pub fn created<T>(result: Result<T>) -> (StatusCode, Reply<T>) {
  let status = if result.is_ok() { StatusCode::CREATED } else { StatusCode::OK };
  (status, reply(result))
}

/// Parse a path id, then run `op` with it. A malformed id never reaches the
/// provider.
pub async fn by_id<T, F, Fut>(field: &'static str, raw: &str, op: F) -> Result<T>
where
  F: FnOnce(Uuid) -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let id = validate::require_uuid(field, raw)?;
  op(id).await
}
