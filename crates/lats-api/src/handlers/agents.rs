//! Handlers for `/shipping-agents`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use lats_core::{
  shipping::{ShippingAgent, ShippingAgentInput},
  store::RemoteStore,
};

use super::{Reply, by_id, created, reply};
use crate::{AppState, auth::Authenticated};

const AGENT_ID: &str = "shipping agent id";

/// `GET /shipping-agents`
pub async fn list<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<ShippingAgent>> {
  reply(state.provider.get_shipping_agents().await)
}

/// `GET /shipping-agents/{id}`
pub async fn get_one<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<ShippingAgent> {
  reply(by_id(AGENT_ID, &id, |id| state.provider.get_shipping_agent(id)).await)
}

/// `POST /shipping-agents`
pub async fn create<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<ShippingAgentInput>,
) -> (StatusCode, Reply<ShippingAgent>) {
  created(state.provider.create_shipping_agent(&session, body).await)
}

/// `PUT /shipping-agents/{id}`
pub async fn update<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<ShippingAgentInput>,
) -> Reply<ShippingAgent> {
  reply(by_id(AGENT_ID, &id, |id| state.provider.update_shipping_agent(&session, id, body)).await)
}

/// `POST /shipping-agents/{id}/toggle`
pub async fn toggle<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<ShippingAgent> {
  reply(by_id(AGENT_ID, &id, |id| state.provider.toggle_shipping_agent(&session, id)).await)
}

/// `DELETE /shipping-agents/{id}`
pub async fn delete<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id(AGENT_ID, &id, |id| state.provider.delete_shipping_agent(&session, id)).await)
}
