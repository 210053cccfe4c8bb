//! Products, variants, shelf locations and stock movements.

use lats_core::{
  product::{
    MovementType, NewProduct, NewVariant, PriceDisplay, Product, ProductUpdate,
    ProductVariant, ShelfLocation, StockMovement,
  },
  store::Row,
};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Fields, category, into_row, put_opt, replace_placeholder_images, supplier, uuid_value};

// ─── Readers ─────────────────────────────────────────────────────────────────

pub fn variant(row: &Row) -> ProductVariant {
  let f = Fields::new(row);
  ProductVariant {
    id:            f.id(),
    product_id:    f.uuid("product_id").unwrap_or_default(),
    sku:           f.text("sku"),
    name:          f.text("name"),
    cost_price:    f.number("cost_price"),
    selling_price: f.number("selling_price"),
    quantity:      f.integer("quantity"),
    min_quantity:  f.integer("min_quantity"),
    attributes:    f.object("attributes"),
    weight:        f.opt_number("weight"),
    dimensions:    f.get("dimensions").cloned(),
    is_active:     f.flag("is_active"),
    created_at:    f.datetime("created_at"),
    updated_at:    f.datetime("updated_at"),
  }
}

/// Location from an embedded `shelf → storage_room → store_location` chain.
fn location_from_chain(shelf: &Row) -> ShelfLocation {
  let s        = Fields::new(shelf);
  let room     = s.nested("storage_room");
  let r        = room.map(Fields::new);
  let location = r.and_then(|r| r.nested("store_location")).map(Fields::new);
  let text     = |f: Option<Fields<'_>>, key: &str| f.map(|f| f.text(key)).unwrap_or_default();

  ShelfLocation {
    shelf_id:            s.uuid("id"),
    shelf_name:          s.text("name"),
    shelf_code:          s.text("code"),
    storage_room_name:   text(r, "name"),
    storage_room_code:   text(r, "code"),
    store_location_name: text(location, "name"),
    store_location_city: text(location, "city"),
    is_refrigerated:     s.bool_or("is_refrigerated", false),
    requires_ladder:     s.bool_or("requires_ladder", false),
  }
}

/// Location already flattened (a serialized [`ShelfLocation`]).
fn location_flat(row: &Row) -> ShelfLocation {
  let f = Fields::new(row);
  ShelfLocation {
    shelf_id:            f.uuid("shelf_id"),
    shelf_name:          f.text("shelf_name"),
    shelf_code:          f.text("shelf_code"),
    storage_room_name:   f.text("storage_room_name"),
    storage_room_code:   f.text("storage_room_code"),
    store_location_name: f.text("store_location_name"),
    store_location_city: f.text("store_location_city"),
    is_refrigerated:     f.bool_or("is_refrigerated", false),
    requires_ladder:     f.bool_or("requires_ladder", false),
  }
}

/// Image URLs: stitched `product_images` rows win over the inline column.
fn images(f: &Fields<'_>) -> Vec<String> {
  let url = |v: &Value| match v {
    Value::String(s) => Some(s.clone()),
    Value::Object(o) => Fields::new(o).opt_text("image_url"),
    _ => None,
  };
  let stitched: Vec<String> = f.list("product_images").iter().filter_map(url).collect();
  let urls = if stitched.is_empty() {
    f.list("images").iter().filter_map(url).collect()
  } else {
    stitched
  };
  replace_placeholder_images(urls)
}

fn format_price(p: f64) -> String {
  if p.fract() == 0.0 {
    format!("{p:.0}")
  } else {
    format!("{p:.2}")
  }
}

/// A single number when every variant price agrees, otherwise a
/// `"min - max"` interval. Zero-priced variants count. Falls back to the
/// product's own price when there are no variants.
pub fn price_display(variants: &[ProductVariant], fallback: f64) -> PriceDisplay {
  let prices = variants.iter().map(|v| v.selling_price);
  let (min, max) = prices.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
    (lo.min(p), hi.max(p))
  });

  if !min.is_finite() {
    PriceDisplay::Single(fallback)
  } else if (max - min).abs() < f64::EPSILON {
    PriceDisplay::Single(min)
  } else {
    PriceDisplay::Range(format!("{} - {}", format_price(min), format_price(max)))
  }
}

/// Lowest positive variant cost, or `fallback` when no variant has one.
pub fn display_cost(variants: &[ProductVariant], fallback: f64) -> f64 {
  variants
    .iter()
    .map(|v| v.cost_price)
    .filter(|c| *c > 0.0)
    .reduce(f64::min)
    .unwrap_or(fallback)
}

pub fn product(row: &Row) -> Product {
  let f = Fields::new(row);
  let variants: Vec<ProductVariant> = f.rows("variants").map(variant).collect();
  let cost_price    = f.number("cost_price");
  let selling_price = f.number("selling_price");
  let location = f
    .nested("shelf")
    .map(location_from_chain)
    .or_else(|| f.nested("location").map(location_flat));

  Product {
    id:              f.id(),
    name:            f.text("name"),
    description:     f.text("description"),
    sku:             f.text("sku"),
    category_id:     f.uuid("category_id"),
    supplier_id:     f.uuid("supplier_id"),
    shelf_id:        f.uuid("store_shelf_id").or_else(|| f.uuid("shelf_id")),
    category:        f.nested("category").map(category),
    supplier:        f.nested("supplier").map(supplier),
    location,
    cost_price,
    selling_price,
    stock_quantity:  f.integer("stock_quantity"),
    min_stock_level: f.integer("min_stock_level"),
    total_quantity:  f.integer("total_quantity"),
    total_value:     f.number("total_value"),
    condition:       f.text("condition"),
    is_active:       f.flag("is_active"),
    tags:            f.strings("tags"),
    images:          images(&f),
    attributes:      f.object("attributes"),
    metadata:        f.object("metadata"),
    display_price:   price_display(&variants, selling_price),
    display_cost:    display_cost(&variants, cost_price),
    variants,
    created_at:      f.datetime("created_at"),
    updated_at:      f.datetime("updated_at"),
  }
}

pub fn stock_movement(row: &Row) -> StockMovement {
  let f = Fields::new(row);
  StockMovement {
    id:                f.id(),
    product_id:        f.uuid("product_id").unwrap_or_default(),
    variant_id:        f.uuid("variant_id").unwrap_or_default(),
    movement_type:     MovementType::try_from(f.text("movement_type").as_str())
      .or_else(|_| MovementType::try_from(f.text("type").as_str()))
      .unwrap_or(MovementType::Adjustment),
    quantity:          f.integer("quantity"),
    previous_quantity: f.integer("previous_quantity"),
    new_quantity:      f.integer("new_quantity"),
    reason:            f.text("reason"),
    reference:         f.text("reference"),
    created_by:        f.text("created_by"),
    created_at:        f.datetime("created_at"),
  }
}

// ─── Writers ─────────────────────────────────────────────────────────────────

/// Validated foreign keys for a product row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRefs {
  pub category_id: Option<Uuid>,
  pub supplier_id: Option<Uuid>,
  pub shelf_id:    Option<Uuid>,
}

pub fn product_row(id: Uuid, input: &NewProduct, refs: ProductRefs, total_quantity: i64) -> Row {
  let cost_price     = input.cost_price.unwrap_or(0.0);
  let stock_quantity = input.stock_quantity.unwrap_or(0);
  into_row(json!({
    "id":              id.to_string(),
    "name":            input.name.trim(),
    "description":     input.description.clone().unwrap_or_default(),
    "sku":             input.sku.clone().unwrap_or_default(),
    "category_id":     uuid_value(refs.category_id),
    "supplier_id":     uuid_value(refs.supplier_id),
    "store_shelf_id":  uuid_value(refs.shelf_id),
    "cost_price":      cost_price,
    "selling_price":   input.selling_price.unwrap_or(0.0),
    "stock_quantity":  stock_quantity,
    "min_stock_level": input.min_stock_level.unwrap_or(0),
    "total_quantity":  total_quantity,
    "total_value":     stock_quantity as f64 * cost_price,
    "condition":       input.condition.clone().unwrap_or_else(|| "new".to_owned()),
    "is_active":       input.is_active.unwrap_or(true),
    "tags":            input.tags,
    "images":          input.images,
    "attributes":      input.attributes.clone().unwrap_or_default(),
    "metadata":        input.metadata.clone().unwrap_or_default(),
  }))
}

pub fn variant_row(product_id: Uuid, sku: &str, input: &NewVariant, index: usize) -> Row {
  into_row(json!({
    "product_id":    product_id.to_string(),
    "sku":           sku,
    "name":          input.name.clone().unwrap_or_else(|| format!("Variant {}", index + 1)),
    "cost_price":    input.cost_price.unwrap_or(0.0),
    "selling_price": input.selling_price.unwrap_or(0.0),
    "quantity":      input.quantity.unwrap_or(0),
    "min_quantity":  input.min_quantity.unwrap_or(0),
    "attributes":    input.attributes.clone().unwrap_or_default(),
    "weight":        input.weight,
    "dimensions":    input.dimensions.clone(),
    "is_active":     true,
  }))
}

/// The single variant synthesized when a product is created without any.
pub fn default_variant_row(product_id: Uuid, sku: &str, input: &NewProduct) -> Row {
  into_row(json!({
    "product_id":    product_id.to_string(),
    "sku":           sku,
    "name":          "Default Variant",
    "cost_price":    input.cost_price.unwrap_or(0.0),
    "selling_price": input.selling_price.unwrap_or(0.0),
    "quantity":      input.stock_quantity.unwrap_or(0),
    "min_quantity":  input.min_stock_level.unwrap_or(0),
    "attributes":    {},
    "weight":        null,
    "dimensions":    null,
    "is_active":     true,
  }))
}

/// Own-column patch for a product update. Foreign keys are validated and
/// added by the caller.
pub fn product_patch(update: &ProductUpdate) -> Row {
  let mut row = Row::new();
  put_opt(&mut row, "name", update.name.as_deref().map(str::trim));
  put_opt(&mut row, "description", update.description.clone());
  put_opt(&mut row, "sku", update.sku.clone());
  put_opt(&mut row, "cost_price", update.cost_price);
  put_opt(&mut row, "selling_price", update.selling_price);
  put_opt(&mut row, "min_stock_level", update.min_stock_level);
  put_opt(&mut row, "condition", update.condition.clone());
  put_opt(&mut row, "is_active", update.is_active);
  put_opt(&mut row, "tags", update.tags.clone());
  put_opt(&mut row, "images", update.images.clone());
  put_opt(&mut row, "attributes", update.attributes.clone());
  put_opt(&mut row, "metadata", update.metadata.clone());
  row
}

pub fn variant_patch(input: &NewVariant, sku: Option<&str>) -> Row {
  let mut row = Row::new();
  put_opt(&mut row, "sku", sku);
  put_opt(&mut row, "name", input.name.clone());
  put_opt(&mut row, "cost_price", input.cost_price);
  put_opt(&mut row, "selling_price", input.selling_price);
  put_opt(&mut row, "quantity", input.quantity);
  put_opt(&mut row, "min_quantity", input.min_quantity);
  put_opt(&mut row, "attributes", input.attributes.clone());
  put_opt(&mut row, "weight", input.weight);
  put_opt(&mut row, "dimensions", input.dimensions.clone());
  row
}

/// One stock change about to be recorded.
pub struct NewMovement<'a> {
  pub product_id: Uuid,
  pub variant_id: Uuid,
  pub previous:   i64,
  pub new:        i64,
  pub reason:     &'a str,
  pub reference:  Option<&'a str>,
  pub created_by: &'a str,
}

pub fn stock_movement_row(m: &NewMovement<'_>) -> Row {
  let movement_type = if m.new >= m.previous { MovementType::In } else { MovementType::Out };
  into_row(json!({
    "product_id":        m.product_id.to_string(),
    "variant_id":        m.variant_id.to_string(),
    "movement_type":     movement_type.as_ref(),
    "quantity":          (m.new - m.previous).abs(),
    "previous_quantity": m.previous,
    "new_quantity":      m.new,
    "reason":            m.reason,
    "reference":         m.reference,
    "created_by":        m.created_by,
  }))
}
