//! Shipping agents and their offices.

use lats_core::{
  Session,
  shipping::{ShippingAgent, ShippingAgentInput},
  store::{Direction, Embed, Filter, RemoteStore, Row, Select},
};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  DataProvider,
  error::{Error, RemoteContext, Result, ValidationError},
  normalize::{self, Fields},
  plan::{QueryPlan, or_empty},
  saga::{Saga, WriteState},
  single, table,
};

fn with_offices(base: Select) -> Select {
  base.embed(Embed::to_many(table::AGENT_OFFICES, "offices", "agent_id").order_by("name", Direction::Asc))
}

fn attach_offices(mut agent: Row, offices: Vec<Row>) -> Row {
  agent.insert(
    "offices".to_owned(),
    Value::Array(offices.into_iter().map(Value::Object).collect()),
  );
  agent
}

impl<S: RemoteStore> DataProvider<S> {
  /// Every agent with offices: the aggregating view first, then the base
  /// table with offices embedded, then the bare table. A store without an
  /// agents table reads as having no agents.
  pub async fn get_shipping_agents(&self) -> Result<Vec<ShippingAgent>> {
    let base = Select::all().order_by("name", Direction::Asc);
    let found = self.load_agents(&base).await;
    match found {
      Ok(rows) => Ok(rows.iter().map(normalize::shipping_agent).collect()),
      Err(err) if err.store_error().is_some_and(|e| e.is_missing_relation()) => {
        debug!("no shipping agents table, returning none");
        Ok(Vec::new())
      }
      Err(err) => Err(err),
    }
  }

  pub async fn get_shipping_agent(&self, id: Uuid) -> Result<ShippingAgent> {
    let base = Select::all().filter(Filter::eq("id", id.to_string()));
    let rows = self.load_agents(&base).await?;
    rows
      .first()
      .map(normalize::shipping_agent)
      .ok_or(Error::NotFound("shipping agent"))
  }

  /// Create an agent together with its offices; the agent row is removed
  /// again if the offices cannot be written.
  pub async fn create_shipping_agent(&self, session: &Session, input: ShippingAgentInput) -> Result<ShippingAgent> {
    self.authorize(session)?;
    if input.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
      return Err(ValidationError::MissingField("name").into());
    }
    if input.offices.iter().any(|o| o.name.trim().is_empty()) {
      return Err(ValidationError::MissingField("office name").into());
    }

    let id = Uuid::new_v4();
    let mut row = normalize::shipping_agent_row(&input, true);
    row.insert("id".to_owned(), Value::String(id.to_string()));

    let mut saga = Saga::new("create shipping agent");
    saga.enter(WriteState::ParentWriting);
    let agent = saga
      .step(
        "create shipping agent",
        self.store.insert(table::AGENTS, vec![row]),
        |_| self.delete_where(table::AGENTS, Filter::eq("id", id.to_string())),
      )
      .await?;
    saga.enter(WriteState::ParentWritten);

    let offices = if input.offices.is_empty() {
      Vec::new()
    } else {
      saga.enter(WriteState::DependentsWriting);
      let rows = input
        .offices
        .iter()
        .map(|office| normalize::agent_office_row(id, office))
        .collect();
      saga
        .run("create agent offices", self.store.insert(table::AGENT_OFFICES, rows))
        .await?
    };
    let agent = match single(agent, "shipping agent") {
      Ok(row) => row,
      Err(err) => return Err(saga.fail(err).await),
    };
    saga.commit();

    let agent = normalize::shipping_agent(&attach_offices(agent, offices));
    info!(agent_id = %id, offices = agent.offices.len(), "shipping agent created");
    self.emit("shipping-agent.created", &agent);
    Ok(agent)
  }

  /// Update the agent's own columns. Offices are left as they are.
  pub async fn update_shipping_agent(
    &self,
    session: &Session,
    id: Uuid,
    input: ShippingAgentInput,
  ) -> Result<ShippingAgent> {
    self.authorize(session)?;
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(ValidationError::MissingField("name").into());
    }
    let row = self
      .update_one(
        table::AGENTS,
        id,
        normalize::shipping_agent_row(&input, false),
        "update shipping agent",
        "shipping agent",
      )
      .await?;
    let agent = self.with_agent_offices(row).await;
    self.emit("shipping-agent.updated", &agent);
    Ok(agent)
  }

  /// Flip the agent's active flag.
  pub async fn toggle_shipping_agent(&self, session: &Session, id: Uuid) -> Result<ShippingAgent> {
    self.authorize(session)?;
    let current = self.fetch_row(table::AGENTS, id, "shipping agent").await?;
    let mut patch = Row::new();
    patch.insert("is_active".to_owned(), Value::Bool(!Fields::new(&current).flag("is_active")));
    let row = self
      .update_one(table::AGENTS, id, patch, "update shipping agent", "shipping agent")
      .await?;
    let agent = self.with_agent_offices(row).await;
    info!(agent_id = %id, active = agent.is_active, "shipping agent toggled");
    self.emit("shipping-agent.updated", &agent);
    Ok(agent)
  }

  /// Delete an agent and its offices.
  pub async fn delete_shipping_agent(&self, session: &Session, id: Uuid) -> Result<()> {
    self.authorize(session)?;
    self.fetch_row(table::AGENTS, id, "shipping agent").await?;
    let offices = self
      .fetch_in(table::AGENT_OFFICES, "agent_id", [id], "load agent offices")
      .await?;

    let office_filter = [Filter::eq("agent_id", id.to_string())];
    let agent_filter  = [Filter::eq("id", id.to_string())];
    let mut saga = Saga::new("delete shipping agent");
    if !offices.is_empty() {
      saga
        .step(
          "delete agent offices",
          self.store.delete(table::AGENT_OFFICES, &office_filter),
          |_| self.reinsert(table::AGENT_OFFICES, offices),
        )
        .await?;
    }
    saga
      .run("delete shipping agent", self.store.delete(table::AGENTS, &agent_filter))
      .await?;
    saga.commit();

    info!(agent_id = %id, "shipping agent deleted");
    self.emit("shipping-agent.deleted", json!({ "id": id }));
    Ok(())
  }

  // ─── Internals ────────────────────────────────────────────────────────────

  async fn select_agents(&self, source: &'static str, query: Select) -> Result<Vec<Row>> {
    let rows = self
      .store
      .select(source, &query)
      .await
      .remote("load shipping agents")?;
    Ok(rows.rows)
  }

  async fn load_agents(&self, base: &Select) -> Result<Vec<Row>> {
    QueryPlan::new("shipping agents")
      .then("view", || self.select_agents(table::AGENTS_WITH_OFFICES, base.clone()))
      .then("embedded", || self.select_agents(table::AGENTS, with_offices(base.clone())))
      .then("table", || self.select_agents(table::AGENTS, base.clone()))
      .run()
      .await
  }

  async fn with_agent_offices(&self, agent: Row) -> ShippingAgent {
    let id = Fields::new(&agent).id();
    let offices = or_empty(
      "agent offices",
      self.fetch_in(table::AGENT_OFFICES, "agent_id", [id], "load agent offices"),
    )
    .await;
    normalize::shipping_agent(&attach_offices(agent, offices))
  }
}
