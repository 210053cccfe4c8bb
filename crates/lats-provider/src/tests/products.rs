use lats_core::{
  product::{ProductUpdate, StockAdjustment},
  store::{Filter, StoreError},
};

use super::support::{Op, count, fixture, product, session, variant};
use crate::{Error, ValidationError, table};

#[tokio::test]
async fn duplicate_skus_in_batch_leave_nothing_behind() {
  let fx = fixture().await;
  let err = fx
    .provider
    .create_product(
      &session(),
      product("Widget", vec![variant("W-1", 1, 5.0, 9.0), variant("W-1", 2, 5.0, 9.0)]),
    )
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::Validation(ValidationError::DuplicateInBatch(ref skus)) if skus == &["W-1"]
  ));
  assert_eq!(count(fx.store(), table::PRODUCTS, Some(Filter::eq("name", "Widget"))).await, 0);
  assert_eq!(fx.store().calls(Op::Insert, table::PRODUCTS), 0);
}

#[tokio::test]
async fn sku_taken_in_store_is_rejected_ignoring_case() {
  let fx = fixture().await;
  fx.provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 1, 5.0, 9.0)]))
    .await
    .unwrap();

  let err = fx
    .provider
    .create_product(&session(), product("Gadget", vec![variant("w-1", 1, 5.0, 9.0)]))
    .await
    .unwrap_err();

  assert_eq!(err.code(), Some("DUPLICATE_SKU"));
  assert_eq!(count(fx.store(), table::PRODUCTS, None).await, 1);
}

#[tokio::test]
async fn variant_write_failure_rolls_back_the_product() {
  let fx = fixture().await;
  fx.store()
    .fail(Op::Insert, table::VARIANTS, StoreError::permission_denied("row-level security"));

  let err = fx
    .provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 1, 5.0, 9.0)]))
    .await
    .unwrap_err();

  assert_eq!(err.store_error().map(|e| e.code.as_str()), Some("42501"));
  assert!(!err.user_message().contains("42501"));
  assert_eq!(count(fx.store(), table::PRODUCTS, None).await, 0);
  assert!(fx.events.topics().is_empty());
}

#[tokio::test]
async fn product_without_variants_gets_one_default_variant() {
  let fx = fixture().await;
  let mut input = product("Cable", Vec::new());
  input.cost_price     = Some(10.0);
  input.selling_price  = Some(15.0);
  input.stock_quantity = Some(4);

  let created = fx.provider.create_product(&session(), input).await.unwrap();

  assert_eq!(created.variants.len(), 1);
  let v = &created.variants[0];
  assert_eq!((v.quantity, v.cost_price, v.selling_price), (4, 10.0, 15.0));
  assert!(v.sku.starts_with("AUTO-"));
  assert_eq!(created.total_quantity, 4);
  assert_eq!(created.total_value, 40.0);
  assert_eq!(fx.events.topics(), ["product.created"]);

  let variants = fx.provider.get_product_variants(created.id).await.unwrap();
  assert_eq!(variants.len(), 1);
}

#[tokio::test]
async fn omitted_variant_prices_default_to_zero() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_product(&session(), product("Bare", Vec::new()))
    .await
    .unwrap();
  let v = &created.variants[0];
  assert_eq!((v.quantity, v.cost_price, v.selling_price), (0, 0.0, 0.0));
}

#[tokio::test]
async fn active_product_names_are_unique() {
  let fx = fixture().await;
  fx.provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 1, 5.0, 9.0)]))
    .await
    .unwrap();

  let err = fx
    .provider
    .create_product(&session(), product("widget", vec![variant("W-2", 1, 5.0, 9.0)]))
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("DUPLICATE_NAME"));
}

#[tokio::test]
async fn malformed_category_is_rejected_but_malformed_supplier_is_dropped() {
  let fx = fixture().await;
  let mut input = product("Widget", Vec::new());
  input.category_id = Some("not-an-id".into());
  let err = fx.provider.create_product(&session(), input).await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::InvalidId { .. })));

  let mut input = product("Widget", Vec::new());
  input.supplier_id = Some("not-an-id".into());
  let created = fx.provider.create_product(&session(), input).await.unwrap();
  assert_eq!(created.supplier_id, None);
}

#[tokio::test]
async fn anonymous_callers_cannot_write() {
  let fx = fixture().await;
  let err = fx
    .provider
    .create_product(&lats_core::Session::new(" "), product("Widget", Vec::new()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
}

#[tokio::test]
async fn failed_update_restores_the_product() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 1, 5.0, 9.0)]))
    .await
    .unwrap();

  fx.store()
    .fail(Op::Insert, table::VARIANTS, StoreError::unavailable("connection reset"));
  let update = ProductUpdate {
    name: Some("Widget Pro".into()),
    variants: Some(vec![variant("W-2", 3, 5.0, 9.0)]),
    ..Default::default()
  };
  let err = fx
    .provider
    .update_product(&session(), created.id, update)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Remote { .. }));

  fx.store().heal();
  let product = fx.provider.get_product(created.id).await.unwrap();
  assert_eq!(product.name, "Widget");
  assert_eq!(product.variants.len(), 1);
}

#[tokio::test]
async fn update_upserts_variants_and_recomputes_total() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 1, 5.0, 9.0)]))
    .await
    .unwrap();

  let mut existing = variant("W-1", 6, 5.0, 9.0);
  existing.id = Some(created.variants[0].id);
  let update = ProductUpdate {
    variants: Some(vec![existing, variant("W-2", 3, 5.0, 12.0)]),
    ..Default::default()
  };
  let updated = fx
    .provider
    .update_product(&session(), created.id, update)
    .await
    .unwrap();

  assert_eq!(updated.variants.len(), 2);
  assert_eq!(updated.total_quantity, 9);
  assert_eq!(fx.events.topics(), ["product.created", "product.updated"]);
}

#[tokio::test]
async fn stock_adjustments_clamp_at_zero_and_are_recorded() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 3, 5.0, 9.0)]))
    .await
    .unwrap();
  let variant_id = created.variants[0].id;

  let adjusted = fx
    .provider
    .adjust_stock(
      &session(),
      created.id,
      StockAdjustment { variant_id, delta: -10, reason: "damaged".into(), reference: None },
    )
    .await
    .unwrap();
  assert_eq!(adjusted.quantity, 0);

  let movements = fx.provider.get_stock_movements(Some(created.id)).await.unwrap();
  assert_eq!(movements.len(), 1);
  assert_eq!((movements[0].previous_quantity, movements[0].new_quantity), (3, 0));
  assert_eq!(fx.provider.get_product(created.id).await.unwrap().total_quantity, 0);
  assert!(fx.events.topics().contains(&"stock.updated".to_owned()));
}

#[tokio::test]
async fn deleted_products_are_retired_not_removed() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_product(&session(), product("Widget", vec![variant("W-1", 3, 5.0, 9.0)]))
    .await
    .unwrap();

  fx.provider.delete_product(&session(), created.id).await.unwrap();

  let product = fx.provider.get_product(created.id).await.unwrap();
  assert!(!product.is_active);
  assert!(product.variants.iter().all(|v| !v.is_active));
  assert!(fx.provider.search_products("widg").await.unwrap().is_empty());
}
