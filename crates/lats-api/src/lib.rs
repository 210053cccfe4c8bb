//! JSON REST API for the LATS back office.
//!
//! Exposes an axum [`Router`] over a [`DataProvider`] backed by any
//! [`RemoteStore`]. Every route sits behind HTTP Basic auth and answers with
//! the `{ ok, data }` / `{ ok: false, message, code? }` envelope.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = lats_api::router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use lats_core::store::RemoteStore;
use lats_provider::{DataProvider, ProviderConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, UserCredentials};
use handlers::{agents, catalog, products, purchase_orders, sales, spare_parts};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub users:      Vec<UserCredentials>,
  #[serde(default)]
  pub provider:   ProviderConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub provider: Arc<DataProvider<S>>,
  pub auth:     Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { provider: Arc::clone(&self.provider), auth: Arc::clone(&self.auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router, with every route under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RemoteStore + 'static,
{
  Router::new()
    .nest("/api", api_routes::<S>())
    .with_state(state)
    .layer(TraceLayer::new_for_http())
}

fn api_routes<S>() -> Router<AppState<S>>
where
  S: RemoteStore + 'static,
{
  Router::new()
    // Products
    .route("/products", get(products::list::<S>).post(products::create::<S>))
    .route("/products/search", get(products::search::<S>))
    .route("/products/low-stock", get(products::low_stock::<S>))
    .route(
      "/products/{id}",
      get(products::get_one::<S>)
        .put(products::update::<S>)
        .delete(products::delete::<S>),
    )
    .route("/products/{id}/variants", get(products::variants::<S>))
    .route("/products/{id}/stock", post(products::adjust_stock::<S>))
    .route("/products/{id}/sales", get(sales::product_sales::<S>))
    .route("/stock-movements", get(products::movements::<S>))
    // Purchase orders
    .route(
      "/purchase-orders",
      get(purchase_orders::list::<S>).post(purchase_orders::create::<S>),
    )
    .route(
      "/purchase-orders/{id}",
      get(purchase_orders::get_one::<S>)
        .patch(purchase_orders::update::<S>)
        .delete(purchase_orders::delete::<S>),
    )
    .route("/purchase-orders/{id}/send", post(purchase_orders::send::<S>))
    .route("/purchase-orders/{id}/receive", post(purchase_orders::receive::<S>))
    // Suppliers, categories and brands
    .route(
      "/suppliers",
      get(catalog::list_suppliers::<S>).post(catalog::create_supplier::<S>),
    )
    .route("/suppliers/paged", get(catalog::supplier_page::<S>))
    .route(
      "/suppliers/{id}",
      get(catalog::get_supplier::<S>)
        .put(catalog::update_supplier::<S>)
        .delete(catalog::delete_supplier::<S>),
    )
    .route(
      "/categories",
      get(catalog::list_categories::<S>).post(catalog::create_category::<S>),
    )
    .route(
      "/categories/{id}",
      axum::routing::put(catalog::update_category::<S>).delete(catalog::delete_category::<S>),
    )
    .route("/brands", get(catalog::list_brands::<S>).post(catalog::create_brand::<S>))
    .route(
      "/brands/{id}",
      axum::routing::put(catalog::update_brand::<S>).delete(catalog::delete_brand::<S>),
    )
    // Spare parts
    .route("/spare-parts", get(spare_parts::list::<S>).post(spare_parts::create::<S>))
    .route("/spare-parts/usage", get(spare_parts::usage::<S>))
    .route(
      "/spare-parts/{id}",
      get(spare_parts::get_one::<S>)
        .put(spare_parts::update::<S>)
        .delete(spare_parts::delete::<S>),
    )
    .route("/spare-parts/{id}/use", post(spare_parts::use_part::<S>))
    // Shipping agents
    .route("/shipping-agents", get(agents::list::<S>).post(agents::create::<S>))
    .route(
      "/shipping-agents/{id}",
      get(agents::get_one::<S>)
        .put(agents::update::<S>)
        .delete(agents::delete::<S>),
    )
    .route("/shipping-agents/{id}/toggle", post(agents::toggle::<S>))
    // Cart and sales
    .route("/cart", get(sales::cart::<S>).delete(sales::clear_cart::<S>))
    .route("/cart/items", post(sales::add_item::<S>))
    .route(
      "/cart/items/{id}",
      axum::routing::put(sales::update_item::<S>).delete(sales::remove_item::<S>),
    )
    .route("/sales", get(sales::list::<S>).post(sales::process::<S>))
    .route("/sales/{id}", get(sales::get_one::<S>))
    .route("/sale-items", get(sales::items::<S>))
    .route(
      "/pos-settings",
      get(sales::settings::<S>).put(sales::update_settings::<S>),
    )
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use lats_provider::Throttler;
  use lats_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  pub(crate) fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  pub(crate) fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store    = SqliteStore::open_in_memory().await.unwrap();
    let provider = DataProvider::new(store, ProviderConfig::default())
      .with_throttler(Throttler::passthrough());
    AppState {
      provider: Arc::new(provider),
      auth:     Arc::new(AuthConfig::new(vec![UserCredentials {
        username:      "clerk".into(),
        password_hash: hash("secret"),
      }])),
    }
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, basic("clerk", "secret"));
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn create_handset(state: &AppState<SqliteStore>, quantity: i64) -> Value {
    let body = json!({
      "name": "Handset",
      "variants": [{ "sku": "HS-1", "quantity": quantity, "sellingPrice": 15.0 }],
    });
    let resp = send(state, "POST", "/api/products", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_credentials_get_401_with_challenge() {
    let state = make_state().await;
    let req   = Request::builder().uri("/api/products").body(Body::empty()).unwrap();
    let resp  = router(state).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert_eq!(challenge, "Basic realm=\"lats\"");
  }

  #[tokio::test]
  async fn wrong_password_gets_401() {
    let state = make_state().await;
    let req   = Request::builder()
      .uri("/api/suppliers")
      .header(header::AUTHORIZATION, basic("clerk", "nope"))
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Products ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn created_product_is_listed() {
    let state   = make_state().await;
    let created = create_handset(&state, 3).await;
    assert_eq!(created["ok"], true);
    assert_eq!(created["data"]["variants"][0]["sku"], "HS-1");

    let listed = json_body(send(&state, "GET", "/api/products?page=1&limit=10", None).await).await;
    assert_eq!(listed["ok"], true);
    assert_eq!(listed["data"]["total"], 1);
    assert_eq!(listed["data"]["data"][0]["name"], "Handset");
  }

  #[tokio::test]
  async fn malformed_path_id_is_a_validation_envelope() {
    let state = make_state().await;
    let resp  = send(&state, "GET", "/api/products/not-a-uuid", None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "VALIDATION");
    assert!(body.get("data").is_none());
  }

  #[tokio::test]
  async fn failed_create_is_200_not_201() {
    let state = make_state().await;
    let resp  = send(&state, "POST", "/api/products", Some(json!({ "name": "  " }))).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["ok"], false);
  }

  #[tokio::test]
  async fn malformed_json_is_rejected_by_the_extractor() {
    let state = make_state().await;
    let req   = Request::builder()
      .method("POST")
      .uri("/api/suppliers")
      .header(header::AUTHORIZATION, basic("clerk", "secret"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{ not json"))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
  }

  #[tokio::test]
  async fn unknown_supplier_is_not_found() {
    let state = make_state().await;
    let uri   = format!("/api/suppliers/{}", uuid::Uuid::new_v4());
    let body  = json_body(send(&state, "GET", &uri, None).await).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "NOT_FOUND");
  }

  // ── Cart and sales ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn overselling_reports_insufficient_stock() {
    let state   = make_state().await;
    let product = create_handset(&state, 2).await;
    let line    = json!({
      "productId": product["data"]["id"],
      "variantId": product["data"]["variants"][0]["id"],
      "quantity":  5,
    });
    let cart = json_body(send(&state, "POST", "/api/cart/items", Some(line)).await).await;
    assert_eq!(cart["data"]["totalItems"], 5);

    let resp = send(&state, "POST", "/api/sales", Some(json!({ "paymentMethod": "cash" }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["details"]["availableQuantity"], 2);
  }

  #[tokio::test]
  async fn completed_sale_empties_the_cart() {
    let state   = make_state().await;
    let product = create_handset(&state, 4).await;
    let line    = json!({
      "productId": product["data"]["id"],
      "variantId": product["data"]["variants"][0]["id"],
      "quantity":  1,
    });
    send(&state, "POST", "/api/cart/items", Some(line)).await;

    let resp = send(&state, "POST", "/api/sales", Some(json!({ "paymentMethod": "cash" }))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["data"]["totalAmount"], 15.0);

    let cart = json_body(send(&state, "GET", "/api/cart", None).await).await;
    assert_eq!(cart["data"]["items"], json!([]));
  }

  // ── Catalog and settings ────────────────────────────────────────────────────

  #[tokio::test]
  async fn brands_are_created_and_listed() {
    let state = make_state().await;
    let resp  = send(&state, "POST", "/api/brands", Some(json!({ "name": "Tecno", "logoUrl": "" }))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = json_body(resp).await["data"]["id"].clone();

    let list = json_body(send(&state, "GET", "/api/brands", None).await).await;
    assert_eq!(list["data"][0]["id"], id);
    assert_eq!(list["data"][0]["isActive"], true);

    let uri  = format!("/api/brands/{}", id.as_str().unwrap());
    let gone = json_body(send(&state, "DELETE", &uri, None).await).await;
    assert_eq!(gone["ok"], true);
  }

  #[tokio::test]
  async fn settings_read_null_until_saved() {
    let state = make_state().await;
    let before = json_body(send(&state, "GET", "/api/pos-settings", None).await).await;
    assert_eq!(before["ok"], true);
    assert_eq!(before["data"], Value::Null);

    let saved = json_body(
      send(&state, "PUT", "/api/pos-settings", Some(json!({ "taxRate": 18.0 }))).await,
    )
    .await;
    assert_eq!(saved["data"]["taxRate"], 18.0);

    let after = json_body(send(&state, "GET", "/api/pos-settings", None).await).await;
    assert_eq!(after["data"]["defaultPaymentMethod"], "cash");
  }
}
