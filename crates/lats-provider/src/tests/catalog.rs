use lats_core::{
  Session,
  catalog::{BrandInput, SupplierInput},
  shipping::{OfficeInput, ShippingAgentInput},
  spare_part::{SparePartInput, UsageRequest},
  store::StoreError,
};

use super::support::{Fixture, Op, count, fixture, session};
use crate::{Error, ValidationError, table};

fn supplier(name: &str) -> SupplierInput {
  SupplierInput { name: Some(name.into()), ..Default::default() }
}

// ─── Suppliers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn suppliers_need_a_name() {
  let fx = fixture().await;
  let err = fx
    .provider
    .create_supplier(&session(), supplier("  "))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::MissingField("name"))));
  assert_eq!(fx.store().calls(Op::Insert, table::SUPPLIERS), 0);
}

#[tokio::test]
async fn suppliers_list_by_name_and_page() {
  let fx = fixture().await;
  for name in ["Zanzibar Traders", "Acme", "Mwenge Imports"] {
    fx.provider.create_supplier(&session(), supplier(name)).await.unwrap();
  }

  let names: Vec<String> = fx
    .provider
    .get_suppliers()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, ["Acme", "Mwenge Imports", "Zanzibar Traders"]);

  let page = fx.provider.get_suppliers_page(2, 2).await.unwrap();
  assert_eq!(page.total, 3);
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].name, "Zanzibar Traders");
}

#[tokio::test]
async fn supplier_page_past_the_end_is_empty() {
  let fx = fixture().await;
  fx.provider.create_supplier(&session(), supplier("Acme")).await.unwrap();

  let page = fx.provider.get_suppliers_page(u64::MAX, u64::MAX).await.unwrap();
  assert_eq!(page.total, 1);
  assert!(page.data.is_empty());
}

#[tokio::test]
async fn supplier_updates_keep_unset_fields() {
  let fx = fixture().await;
  let mut input = supplier("Acme");
  input.phone = Some("+255 700 000 000".into());
  let created = fx.provider.create_supplier(&session(), input).await.unwrap();

  let update = SupplierInput { email: Some("orders@acme.test".into()), ..Default::default() };
  let updated = fx
    .provider
    .update_supplier(&session(), created.id, update)
    .await
    .unwrap();
  assert_eq!(updated.phone, "+255 700 000 000");
  assert_eq!(updated.email, "orders@acme.test");

  fx.provider.delete_supplier(&session(), created.id).await.unwrap();
  let err = fx.provider.get_supplier(created.id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound("supplier")));
}

// ─── Brands ──────────────────────────────────────────────────────────────────

fn brand(name: &str) -> BrandInput {
  BrandInput { name: Some(name.into()), ..Default::default() }
}

#[tokio::test]
async fn brands_list_by_name_including_inactive() {
  let fx = fixture().await;
  for name in ["Tecno", "Apple", "Samsung"] {
    fx.provider.create_brand(&session(), brand(name)).await.unwrap();
  }
  let mut retired = brand("Nokia");
  retired.is_active = Some(false);
  fx.provider.create_brand(&session(), retired).await.unwrap();

  let brands = fx.provider.get_brands().await.unwrap();
  let names: Vec<&str> = brands.iter().map(|b| b.name.as_str()).collect();
  assert_eq!(names, ["Apple", "Nokia", "Samsung", "Tecno"]);
  assert!(!brands[1].is_active);
  assert!(brands[0].is_active);
}

#[tokio::test]
async fn brand_updates_keep_unset_fields() {
  let fx = fixture().await;
  let mut input = brand("Apple");
  input.logo_url = Some("https://cdn.lats.test/apple.svg".into());
  let created = fx.provider.create_brand(&session(), input).await.unwrap();
  assert!(fx.events.topics().contains(&"brand.created".to_owned()));

  let update = BrandInput { category: Some("phone".into()), ..Default::default() };
  let updated = fx
    .provider
    .update_brand(&session(), created.id, update)
    .await
    .unwrap();
  assert_eq!(updated.name, "Apple");
  assert_eq!(updated.logo_url, "https://cdn.lats.test/apple.svg");
  assert_eq!(updated.category, "phone");

  let err = fx
    .provider
    .update_brand(&session(), created.id, brand(" "))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::MissingField("name"))));
}

#[tokio::test]
async fn brand_writes_need_a_session() {
  let fx = fixture().await;
  let err = fx
    .provider
    .create_brand(&Session::new(""), brand("Apple"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
  assert_eq!(fx.store().calls(Op::Insert, table::BRANDS), 0);
}

#[tokio::test]
async fn deleting_a_brand_twice_is_not_found() {
  let fx = fixture().await;
  let created = fx.provider.create_brand(&session(), brand("Apple")).await.unwrap();

  fx.provider.delete_brand(&session(), created.id).await.unwrap();
  assert!(fx.provider.get_brands().await.unwrap().is_empty());
  let err = fx
    .provider
    .delete_brand(&session(), created.id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound("brand")));
  assert!(fx.events.topics().contains(&"brand.deleted".to_owned()));
}

// ─── Spare parts ─────────────────────────────────────────────────────────────

async fn screen(fx: &Fixture, quantity: i64) -> uuid::Uuid {
  let input = SparePartInput {
    name: Some("iPhone 12 screen".into()),
    part_number: Some("SCR-IP12".into()),
    quantity: Some(quantity),
    cost_price: Some(45_000.0),
    ..Default::default()
  };
  fx.provider
    .create_spare_part(&session(), input)
    .await
    .unwrap()
    .id
}

fn usage(quantity: i64) -> UsageRequest {
  UsageRequest { quantity, reason: "repair".into(), notes: None }
}

#[tokio::test]
async fn spare_parts_cannot_go_below_zero() {
  let fx = fixture().await;
  let id = screen(&fx, 2).await;

  let err = fx
    .provider
    .use_spare_part(&session(), id, usage(3))
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("INSUFFICIENT_STOCK"));
  assert_eq!(count(fx.store(), table::SPARE_PART_USAGE, None).await, 0);
}

#[tokio::test]
async fn spare_part_use_is_logged() {
  let fx = fixture().await;
  let id = screen(&fx, 5).await;

  let part = fx
    .provider
    .use_spare_part(&session(), id, usage(2))
    .await
    .unwrap();
  assert_eq!(part.quantity, 3);

  let history = fx.provider.get_spare_part_usage(Some(id)).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].quantity, 2);
  assert_eq!(history[0].used_by, "clerk-1");
  assert!(fx.events.topics().contains(&"spare-part.used".to_owned()));
}

#[tokio::test]
async fn failed_decrement_removes_the_usage_entry() {
  let fx = fixture().await;
  let id = screen(&fx, 5).await;

  fx.store()
    .fail(Op::Update, table::SPARE_PARTS, StoreError::unavailable("connection reset"));
  fx.provider
    .use_spare_part(&session(), id, usage(2))
    .await
    .unwrap_err();

  fx.store().heal();
  assert_eq!(count(fx.store(), table::SPARE_PART_USAGE, None).await, 0);
  assert_eq!(fx.provider.get_spare_part(id).await.unwrap().quantity, 5);
}

// ─── Shipping agents ─────────────────────────────────────────────────────────

fn agent(offices: &[&str]) -> ShippingAgentInput {
  ShippingAgentInput {
    name: Some("Kariakoo Cargo".into()),
    supported_methods: Some(vec!["air".into(), "sea".into()]),
    offices: offices
      .iter()
      .map(|name| OfficeInput { name: (*name).to_owned(), ..Default::default() })
      .collect(),
    ..Default::default()
  }
}

#[tokio::test]
async fn agents_are_created_with_their_offices() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_shipping_agent(&session(), agent(&["Guangzhou", "Dubai"]))
    .await
    .unwrap();

  assert!(created.is_active);
  assert_eq!(created.offices.len(), 2);
  assert_eq!(created.supported_methods, ["air", "sea"]);
  let fetched = fx.provider.get_shipping_agent(created.id).await.unwrap();
  assert_eq!(fetched.offices.len(), 2);
}

#[tokio::test]
async fn failed_offices_remove_the_agent() {
  let fx = fixture().await;
  fx.store()
    .fail(Op::Insert, table::AGENT_OFFICES, StoreError::permission_denied("row-level security"));

  fx.provider
    .create_shipping_agent(&session(), agent(&["Guangzhou"]))
    .await
    .unwrap_err();
  assert_eq!(count(fx.store(), table::AGENTS, None).await, 0);
}

#[tokio::test]
async fn blank_office_names_are_rejected() {
  let fx = fixture().await;
  let err = fx
    .provider
    .create_shipping_agent(&session(), agent(&["Guangzhou", " "]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::MissingField("office name"))));
}

#[tokio::test]
async fn agents_toggle_and_delete_with_offices() {
  let fx = fixture().await;
  let created = fx
    .provider
    .create_shipping_agent(&session(), agent(&["Guangzhou"]))
    .await
    .unwrap();

  let toggled = fx
    .provider
    .toggle_shipping_agent(&session(), created.id)
    .await
    .unwrap();
  assert!(!toggled.is_active);
  assert_eq!(toggled.offices.len(), 1);

  fx.provider
    .delete_shipping_agent(&session(), created.id)
    .await
    .unwrap();
  assert_eq!(count(fx.store(), table::AGENTS, None).await, 0);
  assert_eq!(count(fx.store(), table::AGENT_OFFICES, None).await, 0);
}
