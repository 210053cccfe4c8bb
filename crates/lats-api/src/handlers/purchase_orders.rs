//! Handlers for `/purchase-orders`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/purchase-orders` | |
//! | `POST`   | `/purchase-orders` | Creates a draft with its items |
//! | `GET`    | `/purchase-orders/{id}` | Items, supplier and shipping resolved |
//! | `PATCH`  | `/purchase-orders/{id}` | Shallow update |
//! | `DELETE` | `/purchase-orders/{id}` | Drafts only |
//! | `POST`   | `/purchase-orders/{id}/send` | `draft → sent` |
//! | `POST`   | `/purchase-orders/{id}/receive` | `sent → received` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use lats_core::{
  purchase_order::{NewPurchaseOrder, PurchaseOrder, PurchaseOrderUpdate},
  store::RemoteStore,
};

use super::{Reply, by_id, created, reply};
use crate::{AppState, auth::Authenticated};

const ORDER_ID: &str = "purchase order id";

/// `GET /purchase-orders`
pub async fn list<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<PurchaseOrder>> {
  reply(state.provider.get_purchase_orders().await)
}

/// `POST /purchase-orders`
pub async fn create<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<NewPurchaseOrder>,
) -> (StatusCode, Reply<PurchaseOrder>) {
  created(state.provider.create_purchase_order(&session, body).await)
}

/// `GET /purchase-orders/{id}`
pub async fn get_one<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<PurchaseOrder> {
  reply(state.provider.get_purchase_order(&id).await)
}

/// `PATCH /purchase-orders/{id}`
pub async fn update<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<PurchaseOrderUpdate>,
) -> Reply<PurchaseOrder> {
  reply(by_id(ORDER_ID, &id, |id| state.provider.update_purchase_order(&session, id, body)).await)
}

/// `DELETE /purchase-orders/{id}`
pub async fn delete<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id(ORDER_ID, &id, |id| state.provider.delete_purchase_order(&session, id)).await)
}

/// `POST /purchase-orders/{id}/send`
pub async fn send<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<PurchaseOrder> {
  reply(by_id(ORDER_ID, &id, |id| state.provider.send_purchase_order(&session, id)).await)
}

/// `POST /purchase-orders/{id}/receive`
pub async fn receive<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<PurchaseOrder> {
  reply(by_id(ORDER_ID, &id, |id| state.provider.receive_purchase_order(&session, id)).await)
}
