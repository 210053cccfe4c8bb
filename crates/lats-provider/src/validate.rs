//! Input checks that run before any write reaches the store.
//!
//! SKU uniqueness is checked twice: within the batch being written and
//! against the store. Neither check closes the race with a concurrent writer;
//! the store's unique index does, and [`duplicate_sku_from`] turns its
//! rejection back into the same validation failure.

use std::collections::HashSet;

use lats_core::store::{Filter, RemoteStore, Select, StoreError, StoreErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  error::{RemoteContext, Result, ValidationError},
  normalize::Fields,
};

pub(crate) const VARIANTS: &str = "lats_product_variants";

static DUPLICATE_KEY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"Key \(sku\)=\(([^)]+)\)").expect("duplicate key pattern is valid"));

// ─── Ids ─────────────────────────────────────────────────────────────────────

/// A required id.
pub fn require_uuid(field: &'static str, value: &str) -> Result<Uuid, ValidationError> {
  Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidId {
    field,
    value: value.to_owned(),
  })
}

/// An optional id: blank means absent, anything else must parse.
pub fn optional_uuid(field: &'static str, value: Option<&str>) -> Result<Option<Uuid>, ValidationError> {
  match value.map(str::trim) {
    None | Some("") => Ok(None),
    Some(raw) => require_uuid(field, raw).map(Some),
  }
}

/// An optional id where a malformed value is dropped rather than rejected.
pub fn lenient_uuid(field: &'static str, value: Option<&str>) -> Option<Uuid> {
  optional_uuid(field, value).unwrap_or_else(|err| {
    warn!(field, error = %err, "ignoring malformed reference");
    None
  })
}

// ─── Numbers ─────────────────────────────────────────────────────────────────

pub fn non_negative_price(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
  match value {
    Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::InvalidPrice { field, value: v }),
    _ => Ok(()),
  }
}

pub fn non_negative_quantity(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
  match value {
    Some(v) if v < 0 => Err(ValidationError::InvalidQuantity { field, value: v }),
    _ => Ok(()),
  }
}

pub fn positive_quantity(field: &'static str, value: i64) -> Result<(), ValidationError> {
  if value > 0 {
    Ok(())
  } else {
    Err(ValidationError::InvalidQuantity { field, value })
  }
}

// ─── SKUs ────────────────────────────────────────────────────────────────────

fn non_blank(s: Option<&str>) -> Option<&str> { s.map(str::trim).filter(|s| !s.is_empty()) }

/// The SKU variant `index` will be written with.
///
/// An explicit SKU wins; otherwise the product SKU suffixed with the 1-based
/// index; otherwise one synthesized from the product id. The product id is
/// assigned before validation, so the value checked is the value written.
pub fn derive_sku(explicit: Option<&str>, product_sku: Option<&str>, product_id: Uuid, index: usize) -> String {
  if let Some(sku) = non_blank(explicit) {
    return sku.to_owned();
  }
  match non_blank(product_sku) {
    Some(base) => format!("{base}-{}", index + 1),
    None => auto_sku(product_id, index),
  }
}

/// SKU of the variant synthesized for a product created without any.
pub fn default_sku(product_sku: Option<&str>, product_id: Uuid) -> String {
  non_blank(product_sku).map_or_else(|| auto_sku(product_id, 0), str::to_owned)
}

fn auto_sku(product_id: Uuid, index: usize) -> String {
  let id = product_id.simple().to_string();
  format!("AUTO-{}-{}", &id[..8], index + 1)
}

/// Reject a batch in which two SKUs collide, ignoring case.
pub fn check_batch(skus: &[String]) -> Result<(), ValidationError> {
  let mut seen       = HashSet::new();
  let mut duplicates = Vec::new();
  for sku in skus {
    if !seen.insert(sku.to_lowercase()) && !duplicates.iter().any(|d: &String| d.eq_ignore_ascii_case(sku)) {
      duplicates.push(sku.clone());
    }
  }
  if duplicates.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::DuplicateInBatch(duplicates))
  }
}

/// Reject SKUs that already belong to a variant in the store, other than the
/// variants listed in `own`.
pub async fn check_store<S: RemoteStore>(store: &S, skus: &[String], own: &[Uuid]) -> Result<()> {
  if skus.is_empty() {
    return Ok(());
  }
  let query = Select::all()
    .columns(&["id", "sku"])
    .filter(Filter::any_of_ignore_case("sku", skus.iter().cloned()));
  let existing = store.select(VARIANTS, &query).await.remote("check SKUs")?;

  let taken: Vec<String> = existing
    .rows
    .iter()
    .map(Fields::new)
    .filter(|f| !f.uuid("id").is_some_and(|id| own.contains(&id)))
    .map(|f| f.text("sku"))
    .collect();

  debug!(checked = skus.len(), taken = taken.len(), "SKU store check");
  if taken.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::DuplicateInStore(taken).into())
  }
}

/// Batch check, then store check.
pub async fn validate_skus<S: RemoteStore>(store: &S, skus: &[String], own: &[Uuid]) -> Result<()> {
  check_batch(skus)?;
  check_store(store, skus, own).await
}

/// Recover the offending SKU from a unique-index rejection on variant insert.
pub fn duplicate_sku_from(err: &StoreError) -> Option<ValidationError> {
  if err.kind != StoreErrorKind::UniqueViolation {
    return None;
  }
  let haystack = format!("{} {}", err.message, err.details.as_deref().unwrap_or_default());
  let sku = DUPLICATE_KEY.captures(&haystack)?.get(1)?.as_str().to_owned();
  Some(ValidationError::DuplicateInStore(vec![sku]))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derives_skus_in_order_of_preference() {
    let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
    assert_eq!(derive_sku(Some(" V-9 "), Some("P"), id, 0), "V-9");
    assert_eq!(derive_sku(None, Some("P"), id, 1), "P-2");
    assert_eq!(derive_sku(Some(""), Some("  "), id, 2), "AUTO-1b4e28ba-3");
    assert_eq!(default_sku(Some("P"), id), "P");
    assert_eq!(default_sku(None, id), "AUTO-1b4e28ba-1");
  }

  #[test]
  fn batch_duplicates_ignore_case_and_are_reported_once() {
    let skus = ["W-1", "w-1", "W-2", "W-1"].map(String::from);
    assert_eq!(
      check_batch(&skus),
      Err(ValidationError::DuplicateInBatch(vec!["w-1".into()]))
    );
    assert!(check_batch(&["A".into(), "B".into()]).is_ok());
  }

  #[test]
  fn recovers_sku_from_unique_violation() {
    let err = StoreError::unique_violation("duplicate key value violates unique constraint")
      .with_details("Key (sku)=(W-1) already exists.");
    assert_eq!(
      duplicate_sku_from(&err),
      Some(ValidationError::DuplicateInStore(vec!["W-1".into()]))
    );
    assert_eq!(duplicate_sku_from(&StoreError::unavailable("down")), None);
  }

  #[test]
  fn ids_and_numbers() {
    assert!(optional_uuid("category_id", Some("")).unwrap().is_none());
    assert!(optional_uuid("category_id", Some("nope")).is_err());
    assert!(lenient_uuid("supplier_id", Some("nope")).is_none());
    assert!(non_negative_price("cost_price", Some(-1.0)).is_err());
    assert!(non_negative_quantity("quantity", Some(0)).is_ok());
    assert!(positive_quantity("quantity", 0).is_err());
  }
}
