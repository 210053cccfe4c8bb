//! Reference entities, spare parts, shipping agents, carts, sales and till
//! settings.

use chrono::Utc;
use lats_core::{
  catalog::{Brand, BrandInput, Category, CategoryInput, Supplier, SupplierInput},
  sale::{Cart, CartItem, PosSettings, PosSettingsUpdate, Sale, SaleItem, SaleRequest},
  shipping::{AgentOffice, OfficeInput, ShippingAgent, ShippingAgentInput},
  spare_part::{SparePart, SparePartInput, SparePartUsage, UsageRequest},
  store::Row,
};
use serde_json::json;
use uuid::Uuid;

use super::{Fields, into_row, put_opt, uuid_value};

// ─── Suppliers and categories ────────────────────────────────────────────────

pub fn supplier(row: &Row) -> Supplier {
  let f = Fields::new(row);
  Supplier {
    id:             f.id(),
    name:           f.text("name"),
    contact_person: f.text("contact_person"),
    email:          f.text("email"),
    phone:          f.text("phone"),
    address:        f.text("address"),
    website:        f.text("website"),
    notes:          f.text("notes"),
    is_active:      f.flag("is_active"),
    created_at:     f.datetime("created_at"),
    updated_at:     f.datetime("updated_at"),
  }
}

/// On create every column is written, blanks as `""`; on update only the
/// supplied ones.
pub fn supplier_row(input: &SupplierInput, create: bool) -> Row {
  let mut row = Row::new();
  let text = |v: &Option<String>| if create { Some(v.clone().unwrap_or_default()) } else { v.clone() };
  put_opt(&mut row, "name", text(&input.name).map(|s| s.trim().to_owned()));
  put_opt(&mut row, "contact_person", text(&input.contact_person));
  put_opt(&mut row, "email", text(&input.email));
  put_opt(&mut row, "phone", text(&input.phone));
  put_opt(&mut row, "address", text(&input.address));
  put_opt(&mut row, "website", text(&input.website));
  put_opt(&mut row, "notes", text(&input.notes));
  put_opt(&mut row, "is_active", input.is_active.or(create.then_some(true)));
  row
}

pub fn category(row: &Row) -> Category {
  let f = Fields::new(row);
  Category {
    id:          f.id(),
    name:        f.text("name"),
    description: f.text("description"),
    color:       f.text("color"),
    parent_id:   f.uuid("parent_id"),
    is_active:   f.flag("is_active"),
    created_at:  f.datetime("created_at"),
    updated_at:  f.datetime("updated_at"),
  }
}

pub fn category_row(input: &CategoryInput, create: bool) -> Row {
  let mut row = Row::new();
  let text = |v: &Option<String>| if create { Some(v.clone().unwrap_or_default()) } else { v.clone() };
  put_opt(&mut row, "name", text(&input.name).map(|s| s.trim().to_owned()));
  put_opt(&mut row, "description", text(&input.description));
  put_opt(&mut row, "color", text(&input.color));
  if create || input.parent_id.is_some() {
    row.insert("parent_id".to_owned(), uuid_value(input.parent_id));
  }
  put_opt(&mut row, "is_active", input.is_active.or(create.then_some(true)));
  row
}

pub fn brand(row: &Row) -> Brand {
  let f = Fields::new(row);
  Brand {
    id:          f.id(),
    name:        f.text("name"),
    description: f.text("description"),
    logo_url:    f.text("logo_url"),
    category:    f.text("category"),
    is_active:   f.flag("is_active"),
    created_at:  f.datetime("created_at"),
    updated_at:  f.datetime("updated_at"),
  }
}

pub fn brand_row(input: &BrandInput, create: bool) -> Row {
  let mut row = Row::new();
  let text = |v: &Option<String>| if create { Some(v.clone().unwrap_or_default()) } else { v.clone() };
  put_opt(&mut row, "name", text(&input.name).map(|s| s.trim().to_owned()));
  put_opt(&mut row, "description", text(&input.description));
  put_opt(&mut row, "logo_url", text(&input.logo_url));
  put_opt(&mut row, "category", text(&input.category));
  put_opt(&mut row, "is_active", input.is_active.or(create.then_some(true)));
  row
}

// ─── Spare parts ─────────────────────────────────────────────────────────────

pub fn spare_part(row: &Row) -> SparePart {
  let f = Fields::new(row);
  SparePart {
    id:            f.id(),
    name:          f.text("name"),
    part_number:   f.text("part_number"),
    category_id:   f.uuid("category_id"),
    supplier_id:   f.uuid("supplier_id"),
    condition:     f.text("condition"),
    description:   f.text("description"),
    cost_price:    f.number("cost_price"),
    selling_price: f.number("selling_price"),
    quantity:      f.integer("quantity"),
    min_quantity:  f.integer("min_quantity"),
    location:      f.text("location"),
    is_active:     f.flag("is_active"),
    created_at:    f.datetime("created_at"),
    updated_at:    f.datetime("updated_at"),
  }
}

pub fn spare_part_row(input: &SparePartInput, create: bool) -> Row {
  let mut row = Row::new();
  let text = |v: &Option<String>| if create { Some(v.clone().unwrap_or_default()) } else { v.clone() };
  let number = |v: Option<f64>| if create { Some(v.unwrap_or(0.0)) } else { v };
  let count  = |v: Option<i64>| if create { Some(v.unwrap_or(0)) } else { v };
  put_opt(&mut row, "name", text(&input.name).map(|s| s.trim().to_owned()));
  put_opt(&mut row, "part_number", text(&input.part_number));
  put_opt(&mut row, "condition", input.condition.clone().or(create.then(|| "new".to_owned())));
  put_opt(&mut row, "description", text(&input.description));
  put_opt(&mut row, "location", text(&input.location));
  put_opt(&mut row, "cost_price", number(input.cost_price));
  put_opt(&mut row, "selling_price", number(input.selling_price));
  put_opt(&mut row, "quantity", count(input.quantity));
  put_opt(&mut row, "min_quantity", count(input.min_quantity));
  put_opt(&mut row, "is_active", input.is_active.or(create.then_some(true)));
  for (key, id) in [("category_id", input.category_id), ("supplier_id", input.supplier_id)] {
    if create || id.is_some() {
      row.insert(key.to_owned(), uuid_value(id));
    }
  }
  row
}

pub fn spare_part_usage(row: &Row) -> SparePartUsage {
  let f = Fields::new(row);
  SparePartUsage {
    id:            f.id(),
    spare_part_id: f.uuid("spare_part_id").unwrap_or_default(),
    quantity:      f.integer("quantity"),
    reason:        f.text("reason"),
    notes:         f.text("notes"),
    used_by:       f.text("used_by"),
    used_at:       f.datetime("used_at").or_else(|| f.datetime("created_at")),
  }
}

pub fn spare_part_usage_row(spare_part_id: Uuid, request: &UsageRequest, used_by: &str) -> Row {
  into_row(json!({
    "spare_part_id": spare_part_id.to_string(),
    "quantity":      request.quantity,
    "reason":        request.reason.trim(),
    "notes":         request.notes.clone().unwrap_or_default(),
    "used_by":       used_by,
    "used_at":       Utc::now().to_rfc3339(),
  }))
}

// ─── Shipping agents ─────────────────────────────────────────────────────────

pub fn agent_office(row: &Row) -> AgentOffice {
  let f = Fields::new(row);
  AgentOffice {
    id:       f.id(),
    agent_id: f.uuid("agent_id").unwrap_or_default(),
    name:     f.text("name"),
    address:  f.text("address"),
    city:     f.text("city"),
    phone:    f.text("phone"),
  }
}

pub fn shipping_agent(row: &Row) -> ShippingAgent {
  let f = Fields::new(row);
  ShippingAgent {
    id:                f.id(),
    name:              f.text("name"),
    company:           f.text("company"),
    phone:             f.text("phone"),
    email:             f.text("email"),
    whatsapp:          f.text("whatsapp"),
    supported_methods: f.strings("supported_methods"),
    is_active:         f.flag("is_active"),
    offices:           f.rows("offices").map(agent_office).collect(),
    created_at:        f.datetime("created_at"),
  }
}

pub fn shipping_agent_row(input: &ShippingAgentInput, create: bool) -> Row {
  let mut row = Row::new();
  let text = |v: &Option<String>| if create { Some(v.clone().unwrap_or_default()) } else { v.clone() };
  put_opt(&mut row, "name", text(&input.name).map(|s| s.trim().to_owned()));
  put_opt(&mut row, "company", text(&input.company));
  put_opt(&mut row, "phone", text(&input.phone));
  put_opt(&mut row, "email", text(&input.email));
  put_opt(&mut row, "whatsapp", text(&input.whatsapp));
  put_opt(
    &mut row,
    "supported_methods",
    input.supported_methods.clone().or(create.then(Vec::new)),
  );
  put_opt(&mut row, "is_active", input.is_active.or(create.then_some(true)));
  row
}

pub fn agent_office_row(agent_id: Uuid, input: &OfficeInput) -> Row {
  into_row(json!({
    "agent_id": agent_id.to_string(),
    "name":     input.name.trim(),
    "address":  input.address.clone().unwrap_or_default(),
    "city":     input.city.clone().unwrap_or_default(),
    "phone":    input.phone.clone().unwrap_or_default(),
  }))
}

// ─── Cart and sales ──────────────────────────────────────────────────────────

pub fn cart_item(row: &Row) -> CartItem {
  let f = Fields::new(row);
  let quantity   = f.integer("quantity");
  let unit_price = f.number("unit_price");
  CartItem {
    id:           f.id(),
    cart_id:      f.uuid("cart_id").unwrap_or_default(),
    product_id:   f.uuid("product_id").unwrap_or_default(),
    variant_id:   f.uuid("variant_id").unwrap_or_default(),
    product_name: f.text("product_name"),
    sku:          f.text("sku"),
    quantity,
    unit_price,
    total_price:  quantity as f64 * unit_price,
  }
}

pub fn sale_item(row: &Row) -> SaleItem {
  let f = Fields::new(row);
  SaleItem {
    id:          f.id(),
    sale_id:     f.uuid("sale_id").unwrap_or_default(),
    product_id:  f.uuid("product_id").unwrap_or_default(),
    variant_id:  f.uuid("variant_id").unwrap_or_default(),
    sku:         f.text("sku"),
    quantity:    f.integer("quantity"),
    unit_price:  f.number("unit_price"),
    total_price: f.number("total_price"),
    created_at:  f.datetime("created_at"),
  }
}

pub fn sale(row: &Row) -> Sale {
  let f = Fields::new(row);
  Sale {
    id:             f.id(),
    sale_number:    f.text("sale_number"),
    customer_id:    f.uuid("customer_id"),
    total_amount:   f.number("total_amount"),
    payment_method: f.text("payment_method"),
    status:         f.opt_text("status").unwrap_or_else(|| "completed".to_owned()),
    notes:          f.text("notes"),
    created_by:     f.text("created_by"),
    items:          f.rows("items").map(sale_item).collect(),
    created_at:     f.datetime("created_at"),
  }
}

/// A user's cart from its row, absent when the user has none yet, and its
/// item rows.
pub fn cart(cart_row: Option<&Row>, user_id: &str, items: &[Row]) -> Cart {
  let items: Vec<CartItem> = items.iter().map(cart_item).collect();
  Cart {
    id:          cart_row.map(|r| Fields::new(r).id()),
    user_id:     user_id.to_owned(),
    total:       items.iter().map(|i| i.total_price).sum(),
    total_items: items.iter().map(|i| i.quantity).sum(),
    items,
  }
}

/// A cart line priced from the variant's selling price.
pub fn cart_item_row(cart_id: Uuid, product: &Row, variant: &Row, quantity: i64) -> Row {
  let p = Fields::new(product);
  let v = Fields::new(variant);
  into_row(json!({
    "cart_id":      cart_id.to_string(),
    "product_id":   p.id().to_string(),
    "variant_id":   v.id().to_string(),
    "product_name": p.text("name"),
    "sku":          v.text("sku"),
    "quantity":     quantity,
    "unit_price":   v.number("selling_price"),
  }))
}

pub struct NewSaleRow<'a> {
  pub id:          Uuid,
  pub sale_number: &'a str,
  pub request:     &'a SaleRequest,
  pub total:       f64,
  pub created_by:  &'a str,
}

pub fn sale_row(s: &NewSaleRow<'_>) -> Row {
  into_row(json!({
    "id":             s.id.to_string(),
    "sale_number":    s.sale_number,
    "customer_id":    uuid_value(s.request.customer_id),
    "total_amount":   s.total,
    "payment_method": s.request.payment_method.trim(),
    "status":         "completed",
    "notes":          s.request.notes.clone().unwrap_or_default(),
    "created_by":     s.created_by,
  }))
}

pub fn sale_item_row(sale_id: Uuid, item: &CartItem) -> Row {
  into_row(json!({
    "sale_id":     sale_id.to_string(),
    "product_id":  item.product_id.to_string(),
    "variant_id":  item.variant_id.to_string(),
    "sku":         item.sku,
    "quantity":    item.quantity,
    "unit_price":  item.unit_price,
    "total_price": item.quantity as f64 * item.unit_price,
  }))
}


// ─── Till settings ───────────────────────────────────────────────────────────

/// Stock threshold a fresh settings record starts with.
pub const DEFAULT_STOCK_THRESHOLD: i64 = 5;

pub fn pos_settings(row: &Row) -> PosSettings {
  let f = Fields::new(row);
  PosSettings {
    id:                     f.id(),
    tax_rate:               f.number("tax_rate"),
    currency:               f.text("currency"),
    default_payment_method: f.text("default_payment_method"),
    receipt_header:         f.text("receipt_header"),
    receipt_footer:         f.text("receipt_footer"),
    auto_print:             f.bool_or("auto_print", false),
    low_stock_alert:        f.flag("low_stock_alert"),
    stock_threshold:        f.opt_number("stock_threshold").map_or(DEFAULT_STOCK_THRESHOLD, |n| n as i64),
    updated_at:             f.datetime("updated_at"),
  }
}

/// The supplied settings as a patch. On create the gaps are filled with
/// defaults, the currency with `currency`.
pub fn pos_settings_row(update: &PosSettingsUpdate, create: bool, currency: &str) -> Row {
  let mut row = Row::new();
  let or = |v: Option<String>, default: &str| v.or_else(|| create.then(|| default.to_owned()));
  put_opt(&mut row, "tax_rate", update.tax_rate.or(create.then_some(0.0)));
  put_opt(&mut row, "currency", or(update.currency.clone(), currency));
  put_opt(&mut row, "default_payment_method", or(update.default_payment_method.clone(), "cash"));
  put_opt(&mut row, "receipt_header", or(update.receipt_header.clone(), ""));
  put_opt(&mut row, "receipt_footer", or(update.receipt_footer.clone(), ""));
  put_opt(&mut row, "auto_print", update.auto_print.or(create.then_some(false)));
  put_opt(&mut row, "low_stock_alert", update.low_stock_alert.or(create.then_some(true)));
  put_opt(
    &mut row,
    "stock_threshold",
    update.stock_threshold.or(create.then_some(DEFAULT_STOCK_THRESHOLD)),
  );
  row
}
