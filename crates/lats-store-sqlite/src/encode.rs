//! Conversions between JSON wire values and SQLite parameters.
//!
//! Column names are interpolated into JSON paths, so they are checked against
//! a strict identifier alphabet before use. Values always travel as bound
//! parameters.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use lats_core::store::Row;

use crate::{Error, Result};

/// `json_extract` expression for `column`.
pub fn column_expr(column: &str) -> Result<String> {
  let valid = !column.is_empty()
    && column
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_');
  if !valid {
    return Err(Error::InvalidColumn(column.to_owned()));
  }
  Ok(format!("json_extract(data, '$.{column}')"))
}

/// Bind a JSON scalar the way `json_extract` would surface it.
pub fn sql_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => SqlValue::Real(n.as_f64().unwrap_or_default()),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}

pub fn decode_row(table: &str, data: &str) -> Result<Row> {
  match serde_json::from_str(data)? {
    Value::Object(row) => Ok(row),
    _ => Err(Error::MalformedRow(table.to_owned())),
  }
}

/// Render a row value for an error message.
pub fn display_value(value: Option<&Value>) -> String {
  match value {
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_injection_in_column_names() {
    assert!(column_expr("sku").is_ok());
    assert!(matches!(
      column_expr("sku') OR 1=1 --"),
      Err(Error::InvalidColumn(_))
    ));
    assert!(column_expr("").is_err());
  }

  #[test]
  fn booleans_bind_as_integers() {
    assert_eq!(sql_value(&Value::Bool(true)), SqlValue::Integer(1));
    assert_eq!(sql_value(&serde_json::json!(2.5)), SqlValue::Real(2.5));
  }
}
