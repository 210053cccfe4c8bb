//! Product operations: orchestrated creates and updates, resilient list and
//! detail reads, stock adjustments.

use futures::future::join_all;
use lats_core::{
  Page, Session,
  product::{
    NewProduct, NewVariant, Product, ProductFilters, ProductUpdate, ProductVariant,
    StockAdjustment, StockMovement,
  },
  store::{Direction, Embed, Filter, RemoteStore, Row, Rows, Select, StoreError},
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  DataProvider,
  error::{Error, RemoteContext, Result, ValidationError},
  normalize::{self, Fields, NewMovement, ProductRefs},
  plan::{QueryPlan, has_array, has_object, or_empty, stitch_many, stitch_one},
  saga::{Saga, WriteState},
  single, table,
  validate::{self, non_negative_price, non_negative_quantity},
};

// ─── Query shapes ────────────────────────────────────────────────────────────

fn shelf_chain() -> Embed {
  Embed::to_one(table::SHELVES, "shelf", "store_shelf_id").embed(
    Embed::to_one(table::ROOMS, "storage_room", "storage_room_id").embed(Embed::to_one(
      table::LOCATIONS,
      "store_location",
      "store_location_id",
    )),
  )
}

/// Primary read: category, supplier and the full shelf chain joined in.
fn joined(base: &Select) -> Select {
  base
    .clone()
    .embed(Embed::to_one(table::CATEGORIES, "category", "category_id"))
    .embed(Embed::to_one(table::SUPPLIERS, "supplier", "supplier_id"))
    .embed(shelf_chain())
}

/// Fallback read: only variants and supplier; the rest is stitched later.
fn flat(base: &Select) -> Select {
  base
    .clone()
    .embed(
      Embed::to_many(table::VARIANTS, "variants", "product_id").order_by("created_at", Direction::Asc),
    )
    .embed(Embed::to_one(table::SUPPLIERS, "supplier", "supplier_id"))
}

/// A list filter must be an id string; objects and arrays are rejected.
fn scalar_filter(field: &'static str, value: Option<&Value>) -> Result<Option<Uuid>, ValidationError> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(raw)) => validate::optional_uuid(field, Some(raw.as_str())),
    Some(Value::Object(_) | Value::Array(_)) => Err(ValidationError::InvalidFilter(field)),
    Some(other) => Err(ValidationError::InvalidId { field, value: other.to_string() }),
  }
}

fn row_ids(rows: &[Row]) -> Vec<String> {
  rows.iter().map(|r| Fields::new(r).id().to_string()).collect()
}

/// Map a unique-index rejection on variants back to the SKU that caused it.
pub(crate) fn sku_conflict(err: Error) -> Error {
  match err.store_error().and_then(validate::duplicate_sku_from) {
    Some(v) => v.into(),
    None => err,
  }
}

fn check_variant(v: &NewVariant) -> Result<(), ValidationError> {
  non_negative_price("variant cost price", v.cost_price)?;
  non_negative_price("variant selling price", v.selling_price)?;
  non_negative_quantity("variant quantity", v.quantity)?;
  non_negative_quantity("variant minimum quantity", v.min_quantity)
}

fn check_new_product(input: &NewProduct) -> Result<(), ValidationError> {
  if input.name.trim().is_empty() {
    return Err(ValidationError::MissingField("name"));
  }
  non_negative_price("cost price", input.cost_price)?;
  non_negative_price("selling price", input.selling_price)?;
  non_negative_quantity("stock quantity", input.stock_quantity)?;
  non_negative_quantity("minimum stock level", input.min_stock_level)?;
  input.variants.iter().try_for_each(check_variant)
}

fn check_update(update: &ProductUpdate) -> Result<(), ValidationError> {
  if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
    return Err(ValidationError::MissingField("name"));
  }
  non_negative_price("cost price", update.cost_price)?;
  non_negative_price("selling price", update.selling_price)?;
  non_negative_quantity("minimum stock level", update.min_stock_level)?;
  update.variants.iter().flatten().try_for_each(check_variant)
}

fn flag_patch(key: &str, value: bool) -> Row {
  let mut row = Row::new();
  row.insert(key.to_owned(), Value::Bool(value));
  row
}

// ─── Operations ──────────────────────────────────────────────────────────────

impl<S: RemoteStore> DataProvider<S> {
  /// Create a product and its variants as one logical write.
  ///
  /// Without explicit variants a single default variant is synthesized from
  /// the product-level price and quantity. If any variant cannot be written
  /// the product row is deleted again and the variant error is returned.
  pub async fn create_product(&self, session: &Session, input: NewProduct) -> Result<Product> {
    self.authorize(session)?;
    check_new_product(&input)?;
    let refs = ProductRefs {
      category_id: validate::optional_uuid("category id", input.category_id.as_deref())?,
      supplier_id: validate::lenient_uuid("supplier id", input.supplier_id.as_deref()),
      shelf_id:    validate::lenient_uuid("shelf id", input.shelf_id.as_deref()),
    };

    let id          = Uuid::new_v4();
    let product_sku = input.sku.as_deref();
    let (skus, variant_rows): (Vec<String>, Vec<Row>) = if input.variants.is_empty() {
      let sku = validate::default_sku(product_sku, id);
      let row = normalize::default_variant_row(id, &sku, &input);
      (vec![sku], vec![row])
    } else {
      input
        .variants
        .iter()
        .enumerate()
        .map(|(i, v)| {
          let sku = validate::derive_sku(v.sku.as_deref(), product_sku, id, i);
          let row = normalize::variant_row(id, &sku, v, i);
          (sku, row)
        })
        .unzip()
    };

    validate::validate_skus(&self.store, &skus, &[]).await?;
    self.ensure_name_free(input.name.trim(), None).await?;

    let total_quantity: i64 = variant_rows
      .iter()
      .map(|r| Fields::new(r).integer("quantity"))
      .sum();
    let parent_row = normalize::product_row(id, &input, refs, total_quantity);

    let mut saga = Saga::new("create product");
    saga.enter(WriteState::ParentWriting);
    let parent = saga
      .step(
        "create product",
        self.store.insert(table::PRODUCTS, vec![parent_row]),
        |_| self.delete_where(table::PRODUCTS, Filter::eq("id", id.to_string())),
      )
      .await?;
    saga.enter(WriteState::ParentWritten);

    saga.enter(WriteState::DependentsWriting);
    let variants = saga
      .run(
        "create product variants",
        self.store.insert(table::VARIANTS, variant_rows),
      )
      .await
      .map_err(sku_conflict)?;
    let mut parent = match single(parent, "product") {
      Ok(row) => row,
      Err(err) => return Err(saga.fail(err).await),
    };
    saga.commit();

    info!(product_id = %id, variants = variants.len(), "product created");
    self.emit("product.created", &parent);
    parent.insert(
      "variants".to_owned(),
      Value::Array(variants.into_iter().map(Value::Object).collect()),
    );
    Ok(normalize::product(&parent))
  }

  /// Update a product's own columns and upsert the listed variants.
  ///
  /// Every write is undone if a later one fails: the product and updated
  /// variants are restored from their snapshots, inserted variants deleted.
  pub async fn update_product(&self, session: &Session, id: Uuid, update: ProductUpdate) -> Result<Product> {
    self.authorize(session)?;
    check_update(&update)?;

    let snapshot = self.fetch_row(table::PRODUCTS, id, "product").await?;
    let existing = self.variant_rows(id).await?;
    let own: Vec<Uuid> = existing.iter().map(|r| Fields::new(r).id()).collect();

    let mut patch = normalize::product_patch(&update);
    if let Some(raw) = update.category_id.as_deref() {
      let category = validate::optional_uuid("category id", Some(raw))?;
      patch.insert("category_id".to_owned(), normalize::uuid_value(category));
    }
    if let Some(raw) = update.supplier_id.as_deref() {
      let supplier = validate::lenient_uuid("supplier id", Some(raw));
      patch.insert("supplier_id".to_owned(), normalize::uuid_value(supplier));
    }
    if let Some(raw) = update.shelf_id.as_deref() {
      let shelf = validate::lenient_uuid("shelf id", Some(raw));
      patch.insert("store_shelf_id".to_owned(), normalize::uuid_value(shelf));
    }
    if let Some(name) = update.name.as_deref() {
      self.ensure_name_free(name.trim(), Some(id)).await?;
    }

    // Plan the variant writes before touching anything.
    let product_sku = update
      .sku
      .clone()
      .unwrap_or_else(|| Fields::new(&snapshot).text("sku"));
    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    let mut skus    = Vec::new();
    for v in update.variants.iter().flatten() {
      let current = v
        .id
        .and_then(|vid| existing.iter().find(|r| Fields::new(r).id() == vid));
      match current {
        Some(before) => {
          let sku = v.sku.as_deref().map(str::trim).filter(|s| !s.is_empty());
          skus.extend(sku.map(str::to_owned));
          updates.push((Fields::new(before).id(), normalize::variant_patch(v, sku), before.clone()));
        }
        None => {
          let index = existing.len() + inserts.len();
          let sku = validate::derive_sku(v.sku.as_deref(), Some(product_sku.as_str()), id, index);
          inserts.push(normalize::variant_row(id, &sku, v, index));
          skus.push(sku);
        }
      }
    }
    validate::validate_skus(&self.store, &skus, &own).await?;

    let id_filter = [Filter::eq("id", id.to_string())];
    let mut saga = Saga::new("update product");
    saga.enter(WriteState::ParentWriting);
    if !patch.is_empty() {
      saga
        .step(
          "update product",
          self.store.update(table::PRODUCTS, patch, &id_filter),
          |_| self.restore(table::PRODUCTS, id, snapshot.clone()),
        )
        .await?;
    }
    saga.enter(WriteState::ParentWritten);

    saga.enter(WriteState::DependentsWriting);
    for (variant_id, variant_patch, before) in updates {
      if variant_patch.is_empty() {
        continue;
      }
      let filters = [Filter::eq("id", variant_id.to_string())];
      saga
        .step(
          "update product variant",
          self.store.update(table::VARIANTS, variant_patch, &filters),
          |_| self.restore(table::VARIANTS, variant_id, before),
        )
        .await
        .map_err(sku_conflict)?;
    }
    if !inserts.is_empty() {
      saga
        .step(
          "create product variants",
          self.store.insert(table::VARIANTS, inserts),
          |rows| self.delete_where(table::VARIANTS, Filter::any_of("id", row_ids(rows))),
        )
        .await
        .map_err(sku_conflict)?;
    }

    let (variants, mut parent) = saga
      .run("recompute stock total", self.recompute_total(id))
      .await?;
    saga.commit();

    info!(product_id = %id, "product updated");
    self.emit("product.updated", &parent);
    parent.insert(
      "variants".to_owned(),
      Value::Array(variants.into_iter().map(Value::Object).collect()),
    );
    Ok(normalize::product(&parent))
  }

  /// Retire a product and its variants. Rows stay in place because stock
  /// movements and order items still point at them.
  pub async fn delete_product(&self, session: &Session, id: Uuid) -> Result<()> {
    self.authorize(session)?;
    let snapshot   = self.fetch_row(table::PRODUCTS, id, "product").await?;
    let was_active = Fields::new(&snapshot).flag("is_active");

    let id_filter      = [Filter::eq("id", id.to_string())];
    let variant_filter = [Filter::eq("product_id", id.to_string())];
    let mut saga = Saga::new("retire product");
    saga
      .step(
        "retire product",
        self.store.update(table::PRODUCTS, flag_patch("is_active", false), &id_filter),
        |_| self.restore(table::PRODUCTS, id, flag_patch("is_active", was_active)),
      )
      .await?;
    saga
      .run(
        "retire product variants",
        self.store.update(table::VARIANTS, flag_patch("is_active", false), &variant_filter),
      )
      .await?;
    saga.commit();

    info!(product_id = %id, "product retired");
    self.emit("product.deleted", json!({ "id": id }));
    Ok(())
  }

  /// One page of products, richest read first.
  pub async fn get_products(&self, filters: &ProductFilters) -> Result<Page<Product>> {
    let category = scalar_filter("category id", filters.category_id.as_ref())?;
    let supplier = scalar_filter("supplier id", filters.supplier_id.as_ref())?;
    let page  = filters.page.unwrap_or(1).max(1);
    let limit = filters
      .limit
      .unwrap_or(self.config.default_page_size)
      .clamp(1, self.config.max_page_size.max(1));

    let mut base = Select::all()
      .order_by("name", Direction::Asc)
      .page(page, limit)
      .with_count();
    if let Some(category) = category {
      base = base.filter(Filter::eq("category_id", category.to_string()));
    }
    if let Some(supplier) = supplier {
      base = base.filter(Filter::eq("supplier_id", supplier.to_string()));
    }
    if let Some(active) = filters.is_active {
      base = base.filter(Filter::eq("is_active", active));
    }

    let Rows { mut rows, count } = self.load_products(&base).await?;
    self.enrich_products(&mut rows).await;
    let total = count.unwrap_or(rows.len() as u64);
    Ok(Page::new(rows.iter().map(normalize::product).collect(), total, page, limit))
  }

  pub async fn get_product(&self, id: Uuid) -> Result<Product> {
    let base = Select::all().filter(Filter::eq("id", id.to_string()));
    let mut rows = self.load_products(&base).await?.rows;
    rows.truncate(1);
    self.enrich_products(&mut rows).await;
    rows
      .first()
      .map(normalize::product)
      .ok_or(Error::NotFound("product"))
  }

  /// Active products whose name contains `query`, ignoring case.
  pub async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
    let base = Select::all()
      .filter(Filter::contains("name", query.trim()))
      .filter(Filter::eq("is_active", true))
      .order_by("name", Direction::Asc)
      .range(0, self.config.default_page_size);
    let mut rows = self.load_products(&base).await?.rows;
    self.enrich_products(&mut rows).await;
    Ok(rows.iter().map(normalize::product).collect())
  }

  /// Active products whose total stock is below `threshold`, lowest first.
  pub async fn get_low_stock(&self, threshold: i64) -> Result<Vec<Product>> {
    let base = Select::all()
      .filter(Filter::lt("total_quantity", threshold))
      .filter(Filter::eq("is_active", true))
      .order_by("total_quantity", Direction::Asc)
      .range(0, self.config.max_page_size);
    let mut rows = self.load_products(&base).await?.rows;
    self.enrich_products(&mut rows).await;
    Ok(rows.iter().map(normalize::product).collect())
  }

  pub async fn get_product_variants(&self, product_id: Uuid) -> Result<Vec<ProductVariant>> {
    let rows = self.variant_rows(product_id).await?;
    Ok(rows.iter().map(normalize::variant).collect())
  }

  /// Apply a signed stock change to one variant. The quantity never drops
  /// below zero; every change is recorded as a stock movement.
  pub async fn adjust_stock(
    &self,
    session: &Session,
    product_id: Uuid,
    adjustment: StockAdjustment,
  ) -> Result<ProductVariant> {
    self.authorize(session)?;
    let variant = self
      .fetch_row(table::VARIANTS, adjustment.variant_id, "variant")
      .await?;
    if Fields::new(&variant).uuid("product_id") != Some(product_id) {
      return Err(Error::NotFound("variant"));
    }

    let mut saga = Saga::new("adjust stock");
    let (updated, previous) = self
      .move_stock(
        &mut saga,
        &variant,
        adjustment.delta,
        &adjustment.reason,
        adjustment.reference.as_deref(),
        &session.user_id,
      )
      .await?;
    saga
      .run("recompute stock total", self.recompute_total(product_id))
      .await?;
    saga.commit();

    let variant = normalize::variant(&updated);
    self.emit(
      "stock.updated",
      json!({
        "productId":        product_id,
        "variantId":        variant.id,
        "previousQuantity": previous,
        "newQuantity":      variant.quantity,
      }),
    );
    Ok(variant)
  }

  /// Most recent stock movements, optionally for one product.
  pub async fn get_stock_movements(&self, product_id: Option<Uuid>) -> Result<Vec<StockMovement>> {
    let mut query = Select::all()
      .order_by("created_at", Direction::Desc)
      .range(0, self.config.max_page_size);
    if let Some(product_id) = product_id {
      query = query.filter(Filter::eq("product_id", product_id.to_string()));
    }
    let rows = self
      .store
      .select(table::MOVEMENTS, &query)
      .await
      .remote("load stock movements")?;
    Ok(rows.rows.iter().map(normalize::stock_movement).collect())
  }

  // ─── Internals ────────────────────────────────────────────────────────────

  async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<()> {
    let query = Select::all()
      .columns(&["id", "name", "is_active"])
      .filter(Filter::any_of_ignore_case("name", [name]));
    match self.store.select(table::PRODUCTS, &query).await {
      Ok(found) => {
        let taken = found
          .rows
          .iter()
          .map(Fields::new)
          .any(|f| f.flag("is_active") && Some(f.id()) != except);
        if taken {
          Err(ValidationError::DuplicateName(name.to_owned()).into())
        } else {
          Ok(())
        }
      }
      Err(e) => {
        warn!(code = %e.code, "product name check failed, continuing: {}", e.message);
        Ok(())
      }
    }
  }

  async fn variant_rows(&self, product_id: Uuid) -> Result<Vec<Row>> {
    let query = Select::all()
      .filter(Filter::eq("product_id", product_id.to_string()))
      .order_by("created_at", Direction::Asc);
    Ok(
      self
        .store
        .select(table::VARIANTS, &query)
        .await
        .remote("load product variants")?
        .rows,
    )
  }

  async fn select_products(&self, query: Select) -> Result<Rows> {
    self
      .store
      .select(table::PRODUCTS, &query)
      .await
      .remote("load products")
  }

  async fn load_products(&self, base: &Select) -> Result<Rows> {
    QueryPlan::new("products")
      .then("joined", || self.select_products(joined(base)))
      .then("flat", || self.select_products(flat(base)))
      .run()
      .await
  }

  /// Fill in whatever the answering strategy left out: categories,
  /// suppliers and variants where missing, images always. Each slice is
  /// independent and may come back empty.
  async fn enrich_products(&self, rows: &mut [Row]) {
    let n = rows.len().min(self.config.max_products_enriched);
    let head = &mut rows[..n];
    if head.is_empty() {
      return;
    }

    let wanted = |key: &str, fk: &str| -> Vec<Uuid> {
      head
        .iter()
        .filter(|r| !has_object(r, key))
        .filter_map(|r| Fields::new(r).uuid(fk))
        .collect()
    };
    let category_ids = wanted("category", "category_id");
    let supplier_ids = wanted("supplier", "supplier_id");
    let variant_ids: Vec<Uuid> = head
      .iter()
      .filter(|r| !has_array(r, "variants"))
      .map(|r| Fields::new(r).id())
      .collect();
    let product_ids: Vec<Uuid> = head.iter().map(|r| Fields::new(r).id()).collect();

    let categories = or_empty(
      "categories",
      self.fetch_in(table::CATEGORIES, "id", category_ids, "load categories"),
    )
    .await;
    let suppliers = or_empty(
      "suppliers",
      self.fetch_in(table::SUPPLIERS, "id", supplier_ids, "load suppliers"),
    )
    .await;
    let variants = or_empty(
      "variants",
      self.fetch_in(table::VARIANTS, "product_id", variant_ids, "load product variants"),
    )
    .await;
    let images = self.fetch_images(&product_ids).await;

    debug!(
      products = head.len(),
      categories = categories.len(),
      suppliers = suppliers.len(),
      variants = variants.len(),
      images = images.len(),
      "stitching product slices"
    );
    stitch_one(head, "category", "category_id", categories);
    stitch_one(head, "supplier", "supplier_id", suppliers);
    stitch_many(head, "variants", "product_id", variants);
    stitch_many(head, "product_images", "product_id", images);
  }

  /// Images for `ids`, fetched in fixed-size batches, primary image first.
  /// A failed batch only loses its own images.
  async fn fetch_images(&self, ids: &[Uuid]) -> Vec<Row> {
    let batches: Vec<_> = ids
      .chunks(self.config.image_batch_size.max(1))
      .map(|chunk| {
        let query = Select::all()
          .filter(Filter::any_of("product_id", chunk.iter().map(Uuid::to_string)))
          .order_by("is_primary", Direction::Desc)
          .order_by("created_at", Direction::Asc);
        or_empty("product images", self.image_batch(query))
      })
      .collect();
    join_all(batches).await.into_iter().flatten().collect()
  }

  async fn image_batch(&self, query: Select) -> Result<Vec<Row>> {
    let rows = self
      .store
      .select(table::IMAGES, &query)
      .await
      .remote("load product images")?;
    Ok(rows.rows)
  }

  /// Sum active variant quantities into the product's `total_quantity`.
  /// Returns every variant of the product and the updated product row.
  pub(crate) async fn recompute_total(&self, product_id: Uuid) -> Result<(Vec<Row>, Row), StoreError> {
    let query = Select::all()
      .filter(Filter::eq("product_id", product_id.to_string()))
      .order_by("created_at", Direction::Asc);
    let variants = self.store.select(table::VARIANTS, &query).await?.rows;
    let total: i64 = variants
      .iter()
      .map(Fields::new)
      .filter(|f| f.flag("is_active"))
      .map(|f| f.integer("quantity"))
      .sum();

    let mut patch = Row::new();
    patch.insert("total_quantity".to_owned(), total.into());
    let filters = [Filter::eq("id", product_id.to_string())];
    let parent = self.store.update(table::PRODUCTS, patch, &filters).await?;
    Ok((variants, parent.into_iter().next().unwrap_or_default()))
  }

  /// Change one variant's quantity by `delta` (clamped at zero) and record
  /// the movement, registering both writes with `saga`. Returns the updated
  /// variant row and the quantity before the change.
  pub(crate) async fn move_stock<'a>(
    &'a self,
    saga: &mut Saga<'a>,
    variant: &Row,
    delta: i64,
    reason: &str,
    reference: Option<&str>,
    created_by: &str,
  ) -> Result<(Row, i64)> {
    let f          = Fields::new(variant);
    let variant_id = f.id();
    let product_id = f.uuid("product_id").unwrap_or_default();
    let previous   = f.integer("quantity");
    let new        = (previous + delta).max(0);

    let mut patch = Row::new();
    patch.insert("quantity".to_owned(), new.into());
    let mut undo = Row::new();
    undo.insert("quantity".to_owned(), previous.into());

    let filters = [Filter::eq("id", variant_id.to_string())];
    let updated = saga
      .step(
        "update variant stock",
        self.store.update(table::VARIANTS, patch, &filters),
        |_| self.restore(table::VARIANTS, variant_id, undo),
      )
      .await?;

    let movement = normalize::stock_movement_row(&NewMovement {
      product_id,
      variant_id,
      previous,
      new,
      reason,
      reference,
      created_by,
    });
    saga
      .step(
        "record stock movement",
        self.store.insert(table::MOVEMENTS, vec![movement]),
        |rows| self.delete_where(table::MOVEMENTS, Filter::any_of("id", row_ids(rows))),
      )
      .await?;

    let updated = match single(updated, "variant") {
      Ok(row) => row,
      Err(err) => return Err(saga.fail(err).await),
    };
    debug!(%variant_id, previous, new, "stock moved");
    Ok((updated, previous))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn object_filters_are_rejected() {
    let object = json!({ "id": "x" });
    assert_eq!(
      scalar_filter("category id", Some(&object)),
      Err(ValidationError::InvalidFilter("category id"))
    );
    assert_eq!(scalar_filter("category id", Some(&Value::Null)), Ok(None));
    let id = Uuid::new_v4();
    assert_eq!(
      scalar_filter("category id", Some(&json!(id.to_string()))),
      Ok(Some(id))
    );
  }

  #[test]
  fn stitching_fills_only_missing_slices() {
    let category = Uuid::new_v4();
    let mut rows = vec![
      normalize::into_row(json!({ "id": Uuid::new_v4().to_string(), "category_id": category.to_string() })),
      normalize::into_row(json!({
        "id": Uuid::new_v4().to_string(),
        "category": { "id": Uuid::new_v4().to_string(), "name": "Joined" },
      })),
    ];
    let refs = vec![normalize::into_row(json!({ "id": category.to_string(), "name": "Stitched" }))];
    stitch_one(&mut rows, "category", "category_id", refs);
    assert_eq!(rows[0]["category"]["name"], "Stitched");
    assert_eq!(rows[1]["category"]["name"], "Joined");

    stitch_many(&mut rows, "product_images", "product_id", Vec::new());
    assert_eq!(rows[0]["product_images"], json!([]));
  }
}
