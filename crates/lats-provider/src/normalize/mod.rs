//! Bidirectional mapping between wire rows and the domain model.
//!
//! Readers are total: a missing or `null` numeric field reads as `0`, a
//! missing string as `""`, and `is_active`-style flags as `true` unless the
//! row says `false`. Every reader looks a key up in snake_case first and in
//! camelCase second, so feeding a serialized domain object back through its
//! reader yields the same object.
//!
//! Writers go the other way and only ever emit snake_case keys.

mod order;
mod product;
mod reference;

pub use order::*;
pub use product::*;
pub use reference::*;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use lats_core::store::Row;

// ─── Reader ──────────────────────────────────────────────────────────────────

/// Defaulting accessors over a wire row.
#[derive(Clone, Copy)]
pub struct Fields<'a> {
  row: &'a Row,
}

fn camel_case(key: &str) -> String {
  let mut out   = String::with_capacity(key.len());
  let mut upper = false;
  for c in key.chars() {
    if c == '_' {
      upper = true;
    } else if upper {
      out.extend(c.to_uppercase());
      upper = false;
    } else {
      out.push(c);
    }
  }
  out
}

impl<'a> Fields<'a> {
  pub fn new(row: &'a Row) -> Self { Self { row } }

  /// The non-null value under `key` or its camelCase spelling.
  pub fn get(&self, key: &str) -> Option<&'a Value> {
    let present = |v: &&Value| !v.is_null();
    self
      .row
      .get(key)
      .filter(present)
      .or_else(|| self.row.get(&camel_case(key)).filter(present))
  }

  pub fn text(&self, key: &str) -> String { self.opt_text(key).unwrap_or_default() }

  pub fn opt_text(&self, key: &str) -> Option<String> {
    match self.get(key)? {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  pub fn opt_number(&self, key: &str) -> Option<f64> {
    match self.get(key)? {
      Value::Number(n) => n.as_f64(),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  pub fn number(&self, key: &str) -> f64 { self.opt_number(key).unwrap_or(0.0) }

  pub fn integer(&self, key: &str) -> i64 {
    match self.get(key) {
      Some(Value::Number(n)) => n
        .as_i64()
        .or_else(|| n.as_f64().map(|f| f as i64))
        .unwrap_or(0),
      Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
      _ => 0,
    }
  }

  /// `true` unless the row explicitly says otherwise.
  pub fn flag(&self, key: &str) -> bool { self.bool_or(key, true) }

  pub fn bool_or(&self, key: &str, default: bool) -> bool {
    match self.get(key) {
      Some(Value::Bool(b)) => *b,
      Some(Value::Number(n)) => n.as_i64() != Some(0),
      Some(Value::String(s)) => !matches!(s.as_str(), "false" | "0"),
      _ => default,
    }
  }

  pub fn uuid(&self, key: &str) -> Option<Uuid> {
    self.get(key)?.as_str().and_then(|s| Uuid::parse_str(s).ok())
  }

  /// The row's own id; the nil id when the row has none.
  pub fn id(&self) -> Uuid { self.uuid("id").unwrap_or_default() }

  pub fn datetime(&self, key: &str) -> Option<DateTime<Utc>> {
    let raw = self.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
      .map(|dt| dt.with_timezone(&Utc))
      .ok()
  }

  pub fn object(&self, key: &str) -> Map<String, Value> {
    self.nested(key).cloned().unwrap_or_default()
  }

  pub fn nested(&self, key: &str) -> Option<&'a Row> { self.get(key)?.as_object() }

  pub fn list(&self, key: &str) -> &'a [Value] {
    self
      .get(key)
      .and_then(Value::as_array)
      .map_or(&[], Vec::as_slice)
  }

  /// Objects under an array key, skipping anything that is not an object.
  pub fn rows(&self, key: &str) -> impl Iterator<Item = &'a Row> + use<'a> {
    self.list(key).iter().filter_map(Value::as_object)
  }

  pub fn strings(&self, key: &str) -> Vec<String> {
    self
      .list(key)
      .iter()
      .filter_map(|v| v.as_str().map(str::to_owned))
      .collect()
  }
}

// ─── Writer helpers ──────────────────────────────────────────────────────────

/// Turn a `json!` object literal into a row.
pub fn into_row(value: Value) -> Row {
  match value {
    Value::Object(row) => row,
    _ => Row::new(),
  }
}

/// Insert `key` only when `value` is `Some`.
pub fn put_opt<T: Into<Value>>(row: &mut Row, key: &str, value: Option<T>) {
  if let Some(value) = value {
    row.insert(key.to_owned(), value.into());
  }
}

pub fn uuid_value(id: Option<Uuid>) -> Value {
  id.map_or(Value::Null, |id| Value::String(id.to_string()))
}

/// Empty strings become `null`, so optional dates and ids are stored as
/// absent rather than blank.
pub fn blank_to_null(s: Option<&str>) -> Value {
  match s.map(str::trim) {
    Some(s) if !s.is_empty() => Value::String(s.to_owned()),
    _ => Value::Null,
  }
}

// ─── Images ──────────────────────────────────────────────────────────────────

const UNRELIABLE_IMAGE_HOSTS: &[&str] = &[
  "via.placeholder.com",
  "placehold.it",
  "placehold.co",
  "dummyimage.com",
  "picsum.photos",
  "lorempixel.com",
  "loremflickr.com",
];

fn is_unreliable(url: &str) -> bool {
  let url = url.to_lowercase();
  url.trim().is_empty() || UNRELIABLE_IMAGE_HOSTS.iter().any(|host| url.contains(host))
}

/// A self-contained SVG placeholder as a `data:` URL.
pub fn placeholder_image(label: &str, size: u32) -> String {
  let half = size / 2;
  let svg = format!(
    r##"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" fill="none" xmlns="http://www.w3.org/2000/svg"><rect width="{size}" height="{size}" fill="#F3F4F6"/><text x="{half}" y="{half}" font-family="Arial, sans-serif" font-size="16" fill="#6B6B6B" text-anchor="middle" dy=".3em">{label}</text></svg>"##
  );
  format!("data:image/svg+xml;base64,{}", B64.encode(svg))
}

/// Replace images served by placeholder services with a local placeholder.
pub fn replace_placeholder_images(urls: Vec<String>) -> Vec<String> {
  urls
    .into_iter()
    .map(|url| {
      if is_unreliable(&url) {
        placeholder_image("Product Image", 400)
      } else {
        url
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn reads_snake_then_camel() {
    let row = into_row(json!({ "cost_price": "12.5", "sellingPrice": 20, "isActive": null }));
    let f = Fields::new(&row);
    assert_eq!(f.number("cost_price"), 12.5);
    assert_eq!(f.number("selling_price"), 20.0);
    assert_eq!(f.number("missing"), 0.0);
    assert!(f.flag("is_active"));
    assert_eq!(f.text("name"), "");
  }

  #[test]
  fn explicit_false_flag_is_kept() {
    let row = into_row(json!({ "is_active": false }));
    assert!(!Fields::new(&row).flag("is_active"));
  }

  #[test]
  fn placeholder_hosts_are_replaced() {
    let out = replace_placeholder_images(vec![
      "https://via.placeholder.com/150".into(),
      "https://cdn.example.com/a.png".into(),
    ]);
    assert!(out[0].starts_with("data:image/svg+xml;base64,"));
    assert_eq!(out[1], "https://cdn.example.com/a.png");
  }
}
