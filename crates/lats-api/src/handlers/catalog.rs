//! Handlers for `/suppliers`, `/categories` and `/brands`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use lats_core::{
  Page,
  catalog::{Brand, BrandInput, Category, CategoryInput, Supplier, SupplierInput},
  store::RemoteStore,
};
use serde::Deserialize;

use super::{Reply, by_id, created, reply};
use crate::{AppState, auth::Authenticated};

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub page:  Option<u64>,
  pub limit: Option<u64>,
}

// ─── Suppliers ────────────────────────────────────────────────────────────────

/// `GET /suppliers`
pub async fn list_suppliers<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<Supplier>> {
  reply(state.provider.get_suppliers().await)
}

/// `GET /suppliers/paged?page&limit`
pub async fn supplier_page<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Query(params): Query<PageParams>,
) -> Reply<Page<Supplier>> {
  let page  = params.page.unwrap_or(1);
  let limit = params
    .limit
    .unwrap_or(state.provider.config().default_page_size);
  reply(state.provider.get_suppliers_page(page, limit).await)
}

/// `GET /suppliers/{id}`
pub async fn get_supplier<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<Supplier> {
  reply(by_id("supplier id", &id, |id| state.provider.get_supplier(id)).await)
}

/// `POST /suppliers`
pub async fn create_supplier<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<SupplierInput>,
) -> (StatusCode, Reply<Supplier>) {
  created(state.provider.create_supplier(&session, body).await)
}

/// `PUT /suppliers/{id}`
pub async fn update_supplier<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<SupplierInput>,
) -> Reply<Supplier> {
  reply(by_id("supplier id", &id, |id| state.provider.update_supplier(&session, id, body)).await)
}

/// `DELETE /suppliers/{id}`
pub async fn delete_supplier<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id("supplier id", &id, |id| state.provider.delete_supplier(&session, id)).await)
}

// ─── Categories ───────────────────────────────────────────────────────────────

/// `GET /categories`
pub async fn list_categories<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<Category>> {
  reply(state.provider.get_categories().await)
}

/// `POST /categories`
pub async fn create_category<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<CategoryInput>,
) -> (StatusCode, Reply<Category>) {
  created(state.provider.create_category(&session, body).await)
}

/// `PUT /categories/{id}`
pub async fn update_category<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<CategoryInput>,
) -> Reply<Category> {
  reply(by_id("category id", &id, |id| state.provider.update_category(&session, id, body)).await)
}

/// `DELETE /categories/{id}`
pub async fn delete_category<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id("category id", &id, |id| state.provider.delete_category(&session, id)).await)
}

// ─── Brands ───────────────────────────────────────────────────────────────────

/// `GET /brands`
pub async fn list_brands<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<Brand>> {
  reply(state.provider.get_brands().await)
}

/// `POST /brands`
pub async fn create_brand<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<BrandInput>,
) -> (StatusCode, Reply<Brand>) {
  created(state.provider.create_brand(&session, body).await)
}

/// `PUT /brands/{id}`
pub async fn update_brand<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<BrandInput>,
) -> Reply<Brand> {
  reply(by_id("brand id", &id, |id| state.provider.update_brand(&session, id, body)).await)
}

/// `DELETE /brands/{id}`
pub async fn delete_brand<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id("brand id", &id, |id| state.provider.delete_brand(&session, id)).await)
}
