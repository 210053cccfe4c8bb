//! Handlers for `/products` and `/stock-movements`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/products` | `?page&limit&categoryId&supplierId&isActive` |
//! | `POST`   | `/products` | Creates the product and its variants |
//! | `GET`    | `/products/search` | `?q=` |
//! | `GET`    | `/products/low-stock` | `?threshold=`, default 10 |
//! | `GET`    | `/products/{id}` | |
//! | `PUT`    | `/products/{id}` | Partial update, variants upserted |
//! | `DELETE` | `/products/{id}` | Retires the product |
//! | `GET`    | `/products/{id}/variants` | |
//! | `POST`   | `/products/{id}/stock` | Signed stock adjustment |
//! | `GET`    | `/stock-movements` | `?productId=` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use lats_core::{
  Page,
  product::{
    NewProduct, Product, ProductFilters, ProductUpdate, ProductVariant, StockAdjustment,
    StockMovement,
  },
  store::RemoteStore,
};
use serde::Deserialize;

use super::{Reply, by_id, created, reply};
use crate::{AppState, auth::Authenticated};

const DEFAULT_LOW_STOCK: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
  pub threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementParams {
  pub product_id: Option<String>,
}

/// `GET /products`
pub async fn list<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Query(filters): Query<ProductFilters>,
) -> Reply<Page<Product>> {
  reply(state.provider.get_products(&filters).await)
}

/// `POST /products`
pub async fn create<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<NewProduct>,
) -> (StatusCode, Reply<Product>) {
  created(state.provider.create_product(&session, body).await)
}

/// `GET /products/search?q=`
pub async fn search<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Query(params): Query<SearchParams>,
) -> Reply<Vec<Product>> {
  reply(state.provider.search_products(&params.q).await)
}

/// `GET /products/low-stock`
pub async fn low_stock<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Query(params): Query<LowStockParams>,
) -> Reply<Vec<Product>> {
  let threshold = params.threshold.unwrap_or(DEFAULT_LOW_STOCK);
  reply(state.provider.get_low_stock(threshold).await)
}

/// `GET /products/{id}`
pub async fn get_one<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<Product> {
  reply(by_id("product id", &id, |id| state.provider.get_product(id)).await)
}

/// `PUT /products/{id}`
pub async fn update<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<ProductUpdate>,
) -> Reply<Product> {
  reply(by_id("product id", &id, |id| state.provider.update_product(&session, id, body)).await)
}

/// `DELETE /products/{id}`
pub async fn delete<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id("product id", &id, |id| state.provider.delete_product(&session, id)).await)
}

/// `GET /products/{id}/variants`
pub async fn variants<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<Vec<ProductVariant>> {
  reply(by_id("product id", &id, |id| state.provider.get_product_variants(id)).await)
}

/// `POST /products/{id}/stock`
pub async fn adjust_stock<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<StockAdjustment>,
) -> Reply<ProductVariant> {
  reply(by_id("product id", &id, |id| state.provider.adjust_stock(&session, id, body)).await)
}

/// `GET /stock-movements`
pub async fn movements<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Query(params): Query<MovementParams>,
) -> Reply<Vec<StockMovement>> {
  let result = match params.product_id.as_deref() {
    Some(raw) => by_id("product id", raw, |id| state.provider.get_stock_movements(Some(id))).await,
    None => state.provider.get_stock_movements(None).await,
  };
  reply(result)
}
