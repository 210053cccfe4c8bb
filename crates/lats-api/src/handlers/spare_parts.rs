//! Handlers for `/spare-parts`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use lats_core::{
  spare_part::{SparePart, SparePartInput, SparePartUsage, UsageRequest},
  store::RemoteStore,
};
use serde::Deserialize;

use super::{Reply, by_id, created, reply};
use crate::{AppState, auth::Authenticated};

const PART_ID: &str = "spare part id";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageParams {
  pub spare_part_id: Option<String>,
}

/// `GET /spare-parts`
pub async fn list<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
) -> Reply<Vec<SparePart>> {
  reply(state.provider.get_spare_parts().await)
}

/// `GET /spare-parts/{id}`
pub async fn get_one<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Path(id): Path<String>,
) -> Reply<SparePart> {
  reply(by_id(PART_ID, &id, |id| state.provider.get_spare_part(id)).await)
}

/// `POST /spare-parts`
pub async fn create<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<SparePartInput>,
) -> (StatusCode, Reply<SparePart>) {
  created(state.provider.create_spare_part(&session, body).await)
}

/// `PUT /spare-parts/{id}`
pub async fn update<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<SparePartInput>,
) -> Reply<SparePart> {
  reply(by_id(PART_ID, &id, |id| state.provider.update_spare_part(&session, id, body)).await)
}

/// `DELETE /spare-parts/{id}`
pub async fn delete<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
) -> Reply<()> {
  reply(by_id(PART_ID, &id, |id| state.provider.delete_spare_part(&session, id)).await)
}

/// `POST /spare-parts/{id}/use`
pub async fn use_part<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<UsageRequest>,
) -> Reply<SparePart> {
  reply(by_id(PART_ID, &id, |id| state.provider.use_spare_part(&session, id, body)).await)
}

/// `GET /spare-parts/usage?sparePartId=`
pub async fn usage<S: RemoteStore + 'static>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  Query(params): Query<UsageParams>,
) -> Reply<Vec<SparePartUsage>> {
  let result = match params.spare_part_id.as_deref() {
    Some(raw) => by_id(PART_ID, raw, |id| state.provider.get_spare_part_usage(Some(id))).await,
    None => state.provider.get_spare_part_usage(None).await,
  };
  reply(result)
}
