//! SQL schema for the LATS SQLite store.
//!
//! Each table stores one JSON document per row; `id` is duplicated into the
//! document so every column, including the key, is addressed the same way.

/// Writable entity tables, in no particular order.
pub const TABLES: &[&str] = &[
  "lats_categories",
  "lats_brands",
  "lats_suppliers",
  "lats_store_locations",
  "lats_storage_rooms",
  "lats_store_shelves",
  "lats_products",
  "lats_product_variants",
  "lats_product_images",
  "lats_stock_movements",
  "lats_purchase_orders",
  "lats_purchase_order_items",
  "lats_shipping_info",
  "lats_shipping_events",
  "lats_shipping_agents",
  "lats_shipping_agent_offices",
  "lats_spare_parts",
  "lats_spare_part_usage",
  "lats_cart",
  "lats_cart_items",
  "lats_sales",
  "lats_sale_items",
  "lats_pos_settings",
];

/// Read-only views.
pub const VIEWS: &[&str] = &["lats_shipping_agents_with_offices"];

/// Columns backed by a case-insensitive unique index, per table.
pub const UNIQUE_KEYS: &[(&str, &str)] = &[("lats_product_variants", "sku")];

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS lats_categories             (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_brands                 (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_suppliers              (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_store_locations        (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_storage_rooms          (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_store_shelves          (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_products               (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_product_variants       (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_product_images         (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_stock_movements        (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_purchase_orders        (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_purchase_order_items   (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_shipping_info          (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_shipping_events        (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_shipping_agents        (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_shipping_agent_offices (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_spare_parts            (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_spare_part_usage       (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_cart                   (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_cart_items             (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_sales                  (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_sale_items             (id TEXT PRIMARY KEY, data TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS lats_pos_settings           (id TEXT PRIMARY KEY, data TEXT NOT NULL);

-- SKU uniqueness is global and case-insensitive.
CREATE UNIQUE INDEX IF NOT EXISTS lats_product_variants_sku_key
    ON lats_product_variants (lower(json_extract(data, '$.sku')));

CREATE INDEX IF NOT EXISTS lats_product_variants_product_idx
    ON lats_product_variants (json_extract(data, '$.product_id'));
CREATE INDEX IF NOT EXISTS lats_product_images_product_idx
    ON lats_product_images (json_extract(data, '$.product_id'));
CREATE INDEX IF NOT EXISTS lats_purchase_order_items_order_idx
    ON lats_purchase_order_items (json_extract(data, '$.purchase_order_id'));
CREATE INDEX IF NOT EXISTS lats_stock_movements_product_idx
    ON lats_stock_movements (json_extract(data, '$.product_id'));

CREATE VIEW IF NOT EXISTS lats_shipping_agents_with_offices AS
SELECT a.id AS id,
       json_set(a.data, '$.offices', json((
         SELECT json_group_array(json(o.data))
           FROM lats_shipping_agent_offices o
          WHERE json_extract(o.data, '$.agent_id') = a.id
       ))) AS data
  FROM lats_shipping_agents a;

PRAGMA user_version = 1;
";

pub fn is_table(name: &str) -> bool { TABLES.contains(&name) }

pub fn is_view(name: &str) -> bool { VIEWS.contains(&name) }

pub fn unique_key(table: &str) -> Option<&'static str> {
  UNIQUE_KEYS
    .iter()
    .find(|(t, _)| *t == table)
    .map(|(_, column)| *column)
}
