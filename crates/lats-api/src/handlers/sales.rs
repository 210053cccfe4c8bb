//! Handlers for `/cart`, `/sales` and `/pos-settings`. The cart is always
//! the caller's own.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use lats_core::{
  sale::{AddToCart, Cart, PosSettings, PosSettingsUpdate, Sale, SaleItem, SaleRequest},
  store::RemoteStore,
};
use serde::Deserialize;

use super::{Reply, by_id, created, reply};
use crate::{AppState, auth::Authenticated};

const ITEM_ID: &str = "cart item id";

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
  pub quantity: i64,
}

/// `GET /cart`
pub async fn cart<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
) -> Reply<Cart> {
  reply(state.provider.get_cart(&session).await)
}

/// `DELETE /cart`
pub async fn clear_cart<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
) -> Reply<Cart> {
  reply(state.provider.clear_cart(&session).await)
}

/// `POST /cart/items`
pub async fn add_item<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<AddToCart>,
) -> Reply<Cart> {
  reply(state.provider.add_to_cart(&session, body).await)
}

/// `PUT /cart/items/{id}`
pub async fn update_item<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<QuantityBody>,
) -> Reply<Cart> {
  reply(by_id(ITEM_ID, &id, |id| state.provider.update_cart_item(&session, id, body.quantity)).await)
}

/// `DELETE /cart/items/{id}`
pub async fn remove_item<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<Cart> {
  reply(by_id(ITEM_ID, &id, |id| state.provider.remove_from_cart(&session, id)).await)
}

/// `GET /sales`
pub async fn list<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<Sale>> {
  reply(state.provider.get_sales().await)
}

/// `POST /sales`: turn the caller's cart into a sale.
pub async fn process<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<SaleRequest>,
) -> (StatusCode, Reply<Sale>) {
  created(state.provider.process_sale(&session, body).await)
}

/// `GET /sales/{id}`
pub async fn get_one<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<Sale> {
  reply(by_id("sale id", &id, |id| state.provider.get_sale(id)).await)
}

/// `GET /sale-items`
pub async fn items<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<SaleItem>> {
  reply(state.provider.get_sale_items().await)
}

/// `GET /products/{id}/sales`
pub async fn product_sales<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<Vec<SaleItem>> {
  reply(by_id("product id", &id, |id| state.provider.get_product_sales(id)).await)
}

/// `GET /pos-settings`: `null` until the settings are first saved.
pub async fn settings<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Option<PosSettings>> {
  reply(state.provider.get_pos_settings().await)
}

/// `PUT /pos-settings`
pub async fn update_settings<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<PosSettingsUpdate>,
) -> Reply<PosSettings> {
  reply(state.provider.update_pos_settings(&session, body).await)
}
