//! Suppliers, categories and brands.

use lats_core::{
  Page, Session,
  catalog::{Brand, BrandInput, Category, CategoryInput, Supplier, SupplierInput},
  store::{Direction, Filter, RemoteStore, Select},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
  DataProvider,
  error::{RemoteContext, Result, ValidationError},
  normalize, table,
};

fn required_name(name: Option<&str>) -> Result<(), ValidationError> {
  match name.map(str::trim) {
    Some(n) if !n.is_empty() => Ok(()),
    _ => Err(ValidationError::MissingField("name")),
  }
}

/// A name may be left out of an update, but not blanked.
fn name_not_blank(name: Option<&str>) -> Result<(), ValidationError> {
  match name {
    Some(n) if n.trim().is_empty() => Err(ValidationError::MissingField("name")),
    _ => Ok(()),
  }
}

impl<S: RemoteStore> DataProvider<S> {
  // ─── Suppliers ────────────────────────────────────────────────────────────

  pub async fn get_suppliers(&self) -> Result<Vec<Supplier>> {
    let query = Select::all().order_by("name", Direction::Asc);
    let rows = self
      .store
      .select(table::SUPPLIERS, &query)
      .await
      .remote("load suppliers")?;
    Ok(rows.rows.iter().map(normalize::supplier).collect())
  }

  pub async fn get_suppliers_page(&self, page: u64, limit: u64) -> Result<Page<Supplier>> {
    let page  = page.max(1);
    let limit = limit.clamp(1, self.config.max_page_size.max(1));
    let query = Select::all()
      .order_by("name", Direction::Asc)
      .page(page, limit)
      .with_count();
    let found = self
      .store
      .select(table::SUPPLIERS, &query)
      .await
      .remote("load suppliers")?;
    let total = found.count.unwrap_or(found.rows.len() as u64);
    Ok(Page::new(found.rows.iter().map(normalize::supplier).collect(), total, page, limit))
  }

  pub async fn get_supplier(&self, id: Uuid) -> Result<Supplier> {
    let row = self.fetch_row(table::SUPPLIERS, id, "supplier").await?;
    Ok(normalize::supplier(&row))
  }

  pub async fn create_supplier(&self, session: &Session, input: SupplierInput) -> Result<Supplier> {
    self.authorize(session)?;
    required_name(input.name.as_deref())?;
    let row = self
      .insert_one(
        table::SUPPLIERS,
        normalize::supplier_row(&input, true),
        "create supplier",
        "supplier",
      )
      .await?;
    let supplier = normalize::supplier(&row);
    info!(supplier_id = %supplier.id, "supplier created");
    self.emit("supplier.created", &supplier);
    Ok(supplier)
  }

  pub async fn update_supplier(&self, session: &Session, id: Uuid, input: SupplierInput) -> Result<Supplier> {
    self.authorize(session)?;
    name_not_blank(input.name.as_deref())?;
    let row = self
      .update_one(
        table::SUPPLIERS,
        id,
        normalize::supplier_row(&input, false),
        "update supplier",
        "supplier",
      )
      .await?;
    let supplier = normalize::supplier(&row);
    self.emit("supplier.updated", &supplier);
    Ok(supplier)
  }

  pub async fn delete_supplier(&self, session: &Session, id: Uuid) -> Result<()> {
    self.authorize(session)?;
    self
      .delete_one(table::SUPPLIERS, id, "delete supplier", "supplier")
      .await?;
    info!(supplier_id = %id, "supplier deleted");
    self.emit("supplier.deleted", json!({ "id": id }));
    Ok(())
  }

  // ─── Categories ───────────────────────────────────────────────────────────

  pub async fn get_categories(&self) -> Result<Vec<Category>> {
    let query = Select::all()
      .filter(Filter::eq("is_active", true))
      .order_by("name", Direction::Asc);
    let rows = self
      .store
      .select(table::CATEGORIES, &query)
      .await
      .remote("load categories")?;
    Ok(rows.rows.iter().map(normalize::category).collect())
  }

  pub async fn create_category(&self, session: &Session, input: CategoryInput) -> Result<Category> {
    self.authorize(session)?;
    required_name(input.name.as_deref())?;
    let row = self
      .insert_one(
        table::CATEGORIES,
        normalize::category_row(&input, true),
        "create category",
        "category",
      )
      .await?;
    let category = normalize::category(&row);
    info!(category_id = %category.id, "category created");
    self.emit("category.created", &category);
    Ok(category)
  }

  pub async fn update_category(&self, session: &Session, id: Uuid, input: CategoryInput) -> Result<Category> {
    self.authorize(session)?;
    name_not_blank(input.name.as_deref())?;
    let row = self
      .update_one(
        table::CATEGORIES,
        id,
        normalize::category_row(&input, false),
        "update category",
        "category",
      )
      .await?;
    let category = normalize::category(&row);
    self.emit("category.updated", &category);
    Ok(category)
  }

  pub async fn delete_category(&self, session: &Session, id: Uuid) -> Result<()> {
    self.authorize(session)?;
    self
      .delete_one(table::CATEGORIES, id, "delete category", "category")
      .await?;
    info!(category_id = %id, "category deleted");
    self.emit("category.deleted", json!({ "id": id }));
    Ok(())
  }

  // ─── Brands ───────────────────────────────────────────────────────────────

  /// Every brand, inactive ones included, by name.
  pub async fn get_brands(&self) -> Result<Vec<Brand>> {
    let query = Select::all().order_by("name", Direction::Asc);
    let rows = self
      .store
      .select(table::BRANDS, &query)
      .await
      .remote("load brands")?;
    Ok(rows.rows.iter().map(normalize::brand).collect())
  }

  pub async fn create_brand(&self, session: &Session, input: BrandInput) -> Result<Brand> {
    self.authorize(session)?;
    required_name(input.name.as_deref())?;
    let row = self
      .insert_one(table::BRANDS, normalize::brand_row(&input, true), "create brand", "brand")
      .await?;
    let brand = normalize::brand(&row);
    info!(brand_id = %brand.id, "brand created");
    self.emit("brand.created", &brand);
    Ok(brand)
  }

  pub async fn update_brand(&self, session: &Session, id: Uuid, input: BrandInput) -> Result<Brand> {
    self.authorize(session)?;
    name_not_blank(input.name.as_deref())?;
    let row = self
      .update_one(table::BRANDS, id, normalize::brand_row(&input, false), "update brand", "brand")
      .await?;
    let brand = normalize::brand(&row);
    self.emit("brand.updated", &brand);
    Ok(brand)
  }

  pub async fn delete_brand(&self, session: &Session, id: Uuid) -> Result<()> {
    self.authorize(session)?;
    self
      .delete_one(table::BRANDS, id, "delete brand", "brand")
      .await?;
    info!(brand_id = %id, "brand deleted");
    self.emit("brand.deleted", json!({ "id": id }));
    Ok(())
  }
}
