//! Synchronous statement builders, run on the connection thread.

use chrono::Utc;
use rusqlite::{Connection, params, params_from_iter, types::Value as SqlValue};
use serde_json::Value;
use uuid::Uuid;

use lats_core::store::{Direction, Embed, Filter, Link, Order, Row, Rows, Select};

use crate::{
  Error, Result,
  encode::{column_expr, decode_row, display_value, sql_value},
  schema::{is_table, is_view, unique_key},
};

// ─── Clauses ─────────────────────────────────────────────────────────────────

fn ensure_readable(table: &str) -> Result<()> {
  if is_table(table) || is_view(table) {
    Ok(())
  } else {
    Err(Error::UnknownTable(table.to_owned()))
  }
}

fn ensure_writable(table: &str) -> Result<()> {
  if is_view(table) {
    return Err(Error::ReadOnly(table.to_owned()));
  }
  ensure_readable(table)
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

/// Build ` WHERE ...` (or an empty string) and its bound parameters.
fn where_clause(filters: &[Filter]) -> Result<(String, Vec<SqlValue>)> {
  let mut parts  = Vec::with_capacity(filters.len());
  let mut params = Vec::new();

  for filter in filters {
    let col = column_expr(filter.column())?;
    match filter {
      Filter::Eq(_, Value::Null) | Filter::IsNull(_) => parts.push(format!("{col} IS NULL")),
      Filter::Eq(_, v) => {
        parts.push(format!("{col} = ?"));
        params.push(sql_value(v));
      }
      Filter::Neq(_, Value::Null) => parts.push(format!("{col} IS NOT NULL")),
      Filter::Neq(_, v) => {
        parts.push(format!("({col} IS NULL OR {col} != ?)"));
        params.push(sql_value(v));
      }
      Filter::In(_, values) if values.is_empty() => parts.push("0".to_owned()),
      Filter::In(_, values) => {
        parts.push(format!("{col} IN ({})", placeholders(values.len())));
        params.extend(values.iter().map(sql_value));
      }
      Filter::InIgnoreCase(_, values) if values.is_empty() => parts.push("0".to_owned()),
      Filter::InIgnoreCase(_, values) => {
        let list = vec!["lower(?)"; values.len()].join(", ");
        parts.push(format!("lower({col}) IN ({list})"));
        params.extend(values.iter().map(|v| SqlValue::Text(v.clone())));
      }
      Filter::ILike(_, pattern) => {
        parts.push(format!("{col} LIKE ? ESCAPE '\\'"));
        params.push(SqlValue::Text(pattern.clone()));
      }
      Filter::Lt(_, v) => {
        parts.push(format!("{col} < ?"));
        params.push(sql_value(v));
      }
      Filter::Gt(_, v) => {
        parts.push(format!("{col} > ?"));
        params.push(sql_value(v));
      }
    }
  }

  let sql = if parts.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", parts.join(" AND "))
  };
  Ok((sql, params))
}

/// ` ORDER BY ...`; base tables fall back to insertion order.
fn order_clause(table: &str, order: &[Order]) -> Result<String> {
  let mut terms = order
    .iter()
    .map(|o| {
      let dir = match o.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
      };
      Ok(format!("{} {dir}", column_expr(&o.column)?))
    })
    .collect::<Result<Vec<_>>>()?;

  if is_table(table) {
    terms.push("rowid ASC".to_owned());
  }
  if terms.is_empty() {
    return Ok(String::new());
  }
  Ok(format!(" ORDER BY {}", terms.join(", ")))
}

// ─── Select ──────────────────────────────────────────────────────────────────

pub fn select(conn: &Connection, table: &str, query: &Select) -> Result<Rows> {
  ensure_readable(table)?;
  let (where_sql, mut params) = where_clause(&query.filters)?;

  let count = if query.count {
    let sql = format!("SELECT COUNT(*) FROM {table}{where_sql}");
    let n: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |r| r.get(0))?;
    Some(u64::try_from(n).unwrap_or_default())
  } else {
    None
  };

  let mut sql = format!(
    "SELECT data FROM {table}{where_sql}{}",
    order_clause(table, &query.order)?
  );
  if let Some(range) = query.range {
    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(SqlValue::Integer(i64::try_from(range.limit).unwrap_or(i64::MAX)));
    params.push(SqlValue::Integer(i64::try_from(range.offset).unwrap_or(i64::MAX)));
  }

  let raw: Vec<String> = {
    let mut stmt = conn.prepare(&sql)?;
    stmt
      .query_map(params_from_iter(params.iter()), |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let mut rows = raw
    .iter()
    .map(|data| decode_row(table, data))
    .collect::<Result<Vec<_>>>()?;

  attach_embeds(conn, table, &mut rows, &query.embeds)?;
  project(&mut rows, &query.columns, &query.embeds);

  Ok(Rows { rows, count })
}

/// Resolve each embed with its own query per row. A to-one embed whose key is
/// missing, or whose target row is gone, becomes `null`.
fn attach_embeds(conn: &Connection, table: &str, rows: &mut [Row], embeds: &[Embed]) -> Result<()> {
  for embed in embeds {
    if !is_table(&embed.table) && !is_view(&embed.table) {
      return Err(Error::UnknownRelation {
        from: table.to_owned(),
        to:   embed.table.clone(),
      });
    }

    for row in rows.iter_mut() {
      let nested = Select {
        columns: embed.columns.clone(),
        embeds:  embed.embeds.clone(),
        order:   embed.order.clone(),
        ..Select::default()
      };

      let value = match &embed.link {
        Link::ToOne { local_column } => match row.get(local_column) {
          Some(Value::String(key)) if !key.is_empty() => {
            let query = nested.filter(Filter::eq("id", key.as_str()));
            select(conn, &embed.table, &query)?
              .rows
              .into_iter()
              .next()
              .map_or(Value::Null, Value::Object)
          }
          _ => Value::Null,
        },
        Link::ToMany { foreign_column } => match row.get("id") {
          Some(id) => {
            let query = nested.filter(Filter::Eq(foreign_column.clone(), id.clone()));
            Value::Array(
              select(conn, &embed.table, &query)?
                .rows
                .into_iter()
                .map(Value::Object)
                .collect(),
            )
          }
          None => Value::Array(Vec::new()),
        },
      };

      row.insert(embed.alias.clone(), value);
    }
  }
  Ok(())
}

fn project(rows: &mut [Row], columns: &[String], embeds: &[Embed]) {
  if columns.is_empty() || columns.iter().any(|c| c == "*") {
    return;
  }
  for row in rows {
    row.retain(|key, _| {
      columns.iter().any(|c| c == key) || embeds.iter().any(|e| &e.alias == key)
    });
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Map a constraint failure to [`Error::Duplicate`] naming the offending value.
fn constraint_error(table: &str, row: &Row, err: rusqlite::Error) -> Error {
  let is_constraint = matches!(
    &err,
    rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
  );
  if !is_constraint {
    return Error::Sqlite(err);
  }

  let on_primary_key = err.to_string().contains(&format!("{table}.id"));
  let column = match unique_key(table) {
    Some(column) if !on_primary_key => column,
    _ => "id",
  };
  Error::Duplicate {
    table:  table.to_owned(),
    column: column.to_owned(),
    value:  display_value(row.get(column)),
  }
}

fn is_blank(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.is_empty(),
    Some(_) => false,
  }
}

/// Insert all rows in one transaction: either every row lands or none does.
pub fn insert(conn: &mut Connection, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
  ensure_writable(table)?;
  let now = Value::String(Utc::now().to_rfc3339());
  let tx  = conn.transaction()?;
  let mut inserted = Vec::with_capacity(rows.len());

  {
    let mut stmt = tx.prepare(&format!("INSERT INTO {table} (id, data) VALUES (?1, ?2)"))?;
    for mut row in rows {
      if is_blank(row.get("id")) {
        row.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
      }
      for stamp in ["created_at", "updated_at"] {
        if is_blank(row.get(stamp)) {
          row.insert(stamp.to_owned(), now.clone());
        }
      }

      let id   = display_value(row.get("id"));
      let data = serde_json::to_string(&row)?;
      stmt
        .execute(params![id, data])
        .map_err(|e| constraint_error(table, &row, e))?;
      inserted.push(row);
    }
  }

  tx.commit()?;
  Ok(inserted)
}

pub fn update(conn: &mut Connection, table: &str, patch: &Row, filters: &[Filter]) -> Result<Vec<Row>> {
  ensure_writable(table)?;
  let (where_sql, params) = where_clause(filters)?;
  let now = Value::String(Utc::now().to_rfc3339());
  let tx  = conn.transaction()?;

  let current: Vec<(String, String)> = {
    let mut stmt = tx.prepare(&format!("SELECT id, data FROM {table}{where_sql}"))?;
    stmt
      .query_map(params_from_iter(params.iter()), |r| Ok((r.get(0)?, r.get(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let mut updated = Vec::with_capacity(current.len());
  {
    let mut stmt = tx.prepare(&format!("UPDATE {table} SET data = ?1 WHERE id = ?2"))?;
    for (id, data) in current {
      let mut row = decode_row(table, &data)?;
      for (key, value) in patch {
        if key != "id" {
          row.insert(key.clone(), value.clone());
        }
      }
      row.insert("updated_at".to_owned(), now.clone());

      let data = serde_json::to_string(&row)?;
      stmt
        .execute(params![data, id])
        .map_err(|e| constraint_error(table, &row, e))?;
      updated.push(row);
    }
  }

  tx.commit()?;
  Ok(updated)
}

pub fn delete(conn: &Connection, table: &str, filters: &[Filter]) -> Result<u64> {
  ensure_writable(table)?;
  let (where_sql, params) = where_clause(filters)?;
  let n = conn.execute(
    &format!("DELETE FROM {table}{where_sql}"),
    params_from_iter(params.iter()),
  )?;
  Ok(n as u64)
}
