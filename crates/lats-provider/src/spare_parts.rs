//! Spare parts and their usage log.

use lats_core::{
  Session,
  spare_part::{SparePart, SparePartInput, SparePartUsage, UsageRequest},
  store::{Direction, Filter, RemoteStore, Row, Select},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
  DataProvider,
  error::{Error, RemoteContext, Result, ValidationError},
  normalize::{self, Fields},
  saga::Saga,
  single, table,
  validate::{non_negative_price, non_negative_quantity, positive_quantity},
};

fn check_input(input: &SparePartInput, create: bool) -> Result<(), ValidationError> {
  let name = input.name.as_deref().map(str::trim);
  if (create && name.is_none()) || name == Some("") {
    return Err(ValidationError::MissingField("name"));
  }
  non_negative_price("cost price", input.cost_price)?;
  non_negative_price("selling price", input.selling_price)?;
  non_negative_quantity("quantity", input.quantity)?;
  non_negative_quantity("minimum quantity", input.min_quantity)
}

impl<S: RemoteStore> DataProvider<S> {
  /// Active spare parts by name.
  pub async fn get_spare_parts(&self) -> Result<Vec<SparePart>> {
    let query = Select::all()
      .filter(Filter::eq("is_active", true))
      .order_by("name", Direction::Asc);
    let rows = self
      .store
      .select(table::SPARE_PARTS, &query)
      .await
      .remote("load spare parts")?;
    Ok(rows.rows.iter().map(normalize::spare_part).collect())
  }

  pub async fn get_spare_part(&self, id: Uuid) -> Result<SparePart> {
    let row = self.fetch_row(table::SPARE_PARTS, id, "spare part").await?;
    Ok(normalize::spare_part(&row))
  }

  pub async fn create_spare_part(&self, session: &Session, input: SparePartInput) -> Result<SparePart> {
    self.authorize(session)?;
    check_input(&input, true)?;
    let row = self
      .insert_one(
        table::SPARE_PARTS,
        normalize::spare_part_row(&input, true),
        "create spare part",
        "spare part",
      )
      .await?;
    let part = normalize::spare_part(&row);
    info!(spare_part_id = %part.id, "spare part created");
    self.emit("spare-part.created", &part);
    Ok(part)
  }

  pub async fn update_spare_part(&self, session: &Session, id: Uuid, input: SparePartInput) -> Result<SparePart> {
    self.authorize(session)?;
    check_input(&input, false)?;
    let row = self
      .update_one(
        table::SPARE_PARTS,
        id,
        normalize::spare_part_row(&input, false),
        "update spare part",
        "spare part",
      )
      .await?;
    let part = normalize::spare_part(&row);
    self.emit("spare-part.updated", &part);
    Ok(part)
  }

  pub async fn delete_spare_part(&self, session: &Session, id: Uuid) -> Result<()> {
    self.authorize(session)?;
    self
      .delete_one(table::SPARE_PARTS, id, "delete spare part", "spare part")
      .await?;
    info!(spare_part_id = %id, "spare part deleted");
    self.emit("spare-part.deleted", json!({ "id": id }));
    Ok(())
  }

  /// Withdraw `request.quantity` units. The usage is logged first; if the
  /// stock decrement then fails, the log entry is removed again.
  pub async fn use_spare_part(&self, session: &Session, id: Uuid, request: UsageRequest) -> Result<SparePart> {
    self.authorize(session)?;
    positive_quantity("quantity", request.quantity)?;
    let part      = self.fetch_row(table::SPARE_PARTS, id, "spare part").await?;
    let available = Fields::new(&part).integer("quantity");
    if request.quantity > available {
      return Err(Error::InsufficientStock {
        product_id: id,
        variant_id: None,
        requested:  request.quantity,
        available,
      });
    }

    let usage = normalize::spare_part_usage_row(id, &request, &session.user_id);
    let mut saga = Saga::new("use spare part");
    saga
      .step(
        "record spare part usage",
        self.store.insert(table::SPARE_PART_USAGE, vec![usage]),
        |rows| {
          let ids: Vec<String> = rows.iter().map(|r| Fields::new(r).id().to_string()).collect();
          self.delete_where(table::SPARE_PART_USAGE, Filter::any_of("id", ids))
        },
      )
      .await?;

    let mut patch = Row::new();
    patch.insert("quantity".to_owned(), (available - request.quantity).into());
    let filters = [Filter::eq("id", id.to_string())];
    let rows = saga
      .run(
        "update spare part stock",
        self.store.update(table::SPARE_PARTS, patch, &filters),
      )
      .await?;
    let row = match single(rows, "spare part") {
      Ok(row) => row,
      Err(err) => return Err(saga.fail(err).await),
    };
    saga.commit();

    let part = normalize::spare_part(&row);
    info!(spare_part_id = %id, used = request.quantity, left = part.quantity, "spare part used");
    self.emit(
      "spare-part.used",
      json!({ "id": id, "quantity": request.quantity, "remaining": part.quantity }),
    );
    Ok(part)
  }

  /// Usage entries, newest first, optionally for one part.
  pub async fn get_spare_part_usage(&self, spare_part_id: Option<Uuid>) -> Result<Vec<SparePartUsage>> {
    let mut query = Select::all()
      .order_by("used_at", Direction::Desc)
      .range(0, self.config.max_page_size);
    if let Some(id) = spare_part_id {
      query = query.filter(Filter::eq("spare_part_id", id.to_string()));
    }
    let rows = self
      .store
      .select(table::SPARE_PART_USAGE, &query)
      .await
      .remote("load spare part usage")?;
    Ok(rows.rows.iter().map(normalize::spare_part_usage).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_needs_a_name_update_does_not() {
    assert_eq!(
      check_input(&SparePartInput::default(), true),
      Err(ValidationError::MissingField("name"))
    );
    assert!(check_input(&SparePartInput::default(), false).is_ok());
    let blank = SparePartInput { name: Some("  ".into()), ..Default::default() };
    assert!(check_input(&blank, false).is_err());
    let negative = SparePartInput {
      name: Some("Screen".into()),
      quantity: Some(-1),
      ..Default::default()
    };
    assert!(matches!(
      check_input(&negative, true),
      Err(ValidationError::InvalidQuantity { .. })
    ));
  }
}
