//! Point-of-sale cart, sale processing and till settings.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use lats_core::{
  Session,
  sale::{AddToCart, Cart, PosSettings, PosSettingsUpdate, Sale, SaleItem, SaleRequest},
  store::{Direction, Embed, Filter, RemoteStore, Row, Select},
};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  DataProvider,
  error::{Error, RemoteContext, Result, ValidationError},
  normalize::{self, Fields, NewSaleRow},
  saga::{Saga, WriteState},
  single, table,
  validate::{non_negative_price, non_negative_quantity, positive_quantity},
};

fn sale_number() -> String {
  let suffix = Uuid::new_v4().simple().to_string();
  format!("SALE-{}-{}", Utc::now().format("%Y%m%d"), &suffix[..6])
}

/// Requested quantity per variant, keyed with the owning product. A cart can
/// hold several lines for one variant.
fn demand_per_variant(cart: &Cart) -> BTreeMap<Uuid, (Uuid, i64)> {
  let mut demand = BTreeMap::new();
  for item in &cart.items {
    demand
      .entry(item.variant_id)
      .or_insert((item.product_id, 0))
      .1 += item.quantity;
  }
  demand
}

fn with_sale_items(base: Select) -> Select {
  base.embed(Embed::to_many(table::SALE_ITEMS, "items", "sale_id").order_by("created_at", Direction::Asc))
}

impl<S: RemoteStore> DataProvider<S> {
  // ─── Cart ─────────────────────────────────────────────────────────────────

  /// The caller's cart. A user without one gets an empty cart.
  pub async fn get_cart(&self, session: &Session) -> Result<Cart> {
    self.authorize(session)?;
    let cart  = self.cart_row(&session.user_id).await?;
    let items = match &cart {
      Some(row) => self.cart_items(Fields::new(row).id()).await?,
      None => Vec::new(),
    };
    Ok(normalize::cart(cart.as_ref(), &session.user_id, &items))
  }

  /// Add a variant to the caller's cart, creating the cart on first use. A
  /// variant already in the cart has its quantity raised instead.
  pub async fn add_to_cart(&self, session: &Session, request: AddToCart) -> Result<Cart> {
    self.authorize(session)?;
    positive_quantity("quantity", request.quantity)?;
    let variant = self
      .fetch_row(table::VARIANTS, request.variant_id, "variant")
      .await?;
    if Fields::new(&variant).uuid("product_id") != Some(request.product_id) {
      return Err(Error::NotFound("variant"));
    }
    let product = self
      .fetch_row(table::PRODUCTS, request.product_id, "product")
      .await?;

    let cart_id = match self.cart_row(&session.user_id).await? {
      Some(row) => Fields::new(&row).id(),
      None => {
        let row = normalize::into_row(json!({ "user_id": session.user_id }));
        let cart = self.insert_one(table::CARTS, row, "create cart", "cart").await?;
        Fields::new(&cart).id()
      }
    };

    let existing = self
      .cart_items(cart_id)
      .await?
      .into_iter()
      .find(|item| Fields::new(item).uuid("variant_id") == Some(request.variant_id));
    match existing {
      Some(item) => {
        let f = Fields::new(&item);
        let mut patch = Row::new();
        patch.insert("quantity".to_owned(), (f.integer("quantity") + request.quantity).into());
        self
          .update_one(table::CART_ITEMS, f.id(), patch, "update cart item", "cart item")
          .await?;
      }
      None => {
        let row = normalize::cart_item_row(cart_id, &product, &variant, request.quantity);
        self
          .insert_one(table::CART_ITEMS, row, "add to cart", "cart item")
          .await?;
      }
    }
    self.get_cart(session).await
  }

  /// Set a line's quantity; zero or less removes the line.
  pub async fn update_cart_item(&self, session: &Session, item_id: Uuid, quantity: i64) -> Result<Cart> {
    self.authorize(session)?;
    self.own_cart_item(session, item_id).await?;
    if quantity <= 0 {
      self
        .delete_one(table::CART_ITEMS, item_id, "remove from cart", "cart item")
        .await?;
    } else {
      let mut patch = Row::new();
      patch.insert("quantity".to_owned(), quantity.into());
      self
        .update_one(table::CART_ITEMS, item_id, patch, "update cart item", "cart item")
        .await?;
    }
    self.get_cart(session).await
  }

  pub async fn remove_from_cart(&self, session: &Session, item_id: Uuid) -> Result<Cart> {
    self.authorize(session)?;
    self.own_cart_item(session, item_id).await?;
    self
      .delete_one(table::CART_ITEMS, item_id, "remove from cart", "cart item")
      .await?;
    self.get_cart(session).await
  }

  pub async fn clear_cart(&self, session: &Session) -> Result<Cart> {
    self.authorize(session)?;
    if let Some(cart) = self.cart_row(&session.user_id).await? {
      let filters = [Filter::eq("cart_id", Fields::new(&cart).id().to_string())];
      self
        .store
        .delete(table::CART_ITEMS, &filters)
        .await
        .remote("clear cart")?;
    }
    self.get_cart(session).await
  }

  // ─── Sales ────────────────────────────────────────────────────────────────

  /// Turn the caller's cart into a sale.
  ///
  /// Lines are summed per variant and each total is checked against that
  /// variant's stock before anything is written; the first short variant
  /// fails the sale. Each variant is decremented once. The sale row, its items
  /// and each stock decrement are one saga. The cart is emptied afterwards.
  pub async fn process_sale(&self, session: &Session, request: SaleRequest) -> Result<Sale> {
    let cart = self.get_cart(session).await?;
    if cart.items.is_empty() {
      return Err(ValidationError::EmptyCart.into());
    }

    let variants: HashMap<Uuid, Row> = self
      .fetch_in(
        table::VARIANTS,
        "id",
        cart.items.iter().map(|i| i.variant_id),
        "check stock",
      )
      .await?
      .into_iter()
      .map(|row| (Fields::new(&row).id(), row))
      .collect();
    let demand = demand_per_variant(&cart);
    for (&variant_id, &(product_id, requested)) in &demand {
      let variant   = variants.get(&variant_id).ok_or(Error::NotFound("variant"))?;
      let available = Fields::new(variant).integer("quantity");
      if requested > available {
        return Err(Error::InsufficientStock {
          product_id,
          variant_id: Some(variant_id),
          requested,
          available,
        });
      }
    }

    let id     = Uuid::new_v4();
    let number = sale_number();
    let sale_row = normalize::sale_row(&NewSaleRow {
      id,
      sale_number: &number,
      request: &request,
      total: cart.total,
      created_by: &session.user_id,
    });
    let item_rows: Vec<Row> = cart
      .items
      .iter()
      .map(|item| normalize::sale_item_row(id, item))
      .collect();

    let mut saga = Saga::new("process sale");
    saga.enter(WriteState::ParentWriting);
    let sale = saga
      .step(
        "create sale",
        self.store.insert(table::SALES, vec![sale_row]),
        |_| self.delete_where(table::SALES, Filter::eq("id", id.to_string())),
      )
      .await?;
    saga.enter(WriteState::ParentWritten);

    saga.enter(WriteState::DependentsWriting);
    let items = saga
      .step(
        "create sale items",
        self.store.insert(table::SALE_ITEMS, item_rows),
        |_| self.delete_where(table::SALE_ITEMS, Filter::eq("sale_id", id.to_string())),
      )
      .await?;

    let mut products = BTreeSet::new();
    for (variant_id, (product_id, requested)) in &demand {
      let Some(variant) = variants.get(variant_id) else {
        continue;
      };
      self
        .move_stock(
          &mut saga,
          variant,
          -requested,
          "sale",
          Some(number.as_str()),
          &session.user_id,
        )
        .await?;
      products.insert(*product_id);
    }
    for product_id in products {
      saga
        .run("recompute stock total", self.recompute_total(product_id))
        .await?;
    }
    let mut sale = match single(sale, "sale") {
      Ok(row) => row,
      Err(err) => return Err(saga.fail(err).await),
    };
    saga.commit();

    if let Err(err) = self.clear_cart(session).await {
      warn!(sale_id = %id, error = %err, "sale recorded but cart could not be cleared");
    }

    sale.insert(
      "items".to_owned(),
      Value::Array(items.into_iter().map(Value::Object).collect()),
    );
    let sale = normalize::sale(&sale);
    info!(sale_id = %id, sale_number = %sale.sale_number, total = sale.total_amount, "sale processed");
    self.emit("sale.created", &sale);
    Ok(sale)
  }

  /// Every sale with its items, newest first.
  pub async fn get_sales(&self) -> Result<Vec<Sale>> {
    let query = with_sale_items(Select::all().order_by("created_at", Direction::Desc));
    let rows = self
      .store
      .select(table::SALES, &query)
      .await
      .remote("load sales")?;
    Ok(rows.rows.iter().map(normalize::sale).collect())
  }

  pub async fn get_sale(&self, id: Uuid) -> Result<Sale> {
    let query = with_sale_items(Select::all().filter(Filter::eq("id", id.to_string())));
    let rows = self
      .store
      .select(table::SALES, &query)
      .await
      .remote("load sale")?;
    rows
      .rows
      .first()
      .map(normalize::sale)
      .ok_or(Error::NotFound("sale"))
  }

  /// Every sold line across all sales, newest first.
  pub async fn get_sale_items(&self) -> Result<Vec<SaleItem>> {
    self.sale_items(Select::all(), "load sale items").await
  }

  /// The sold lines of one product, newest first.
  pub async fn get_product_sales(&self, product_id: Uuid) -> Result<Vec<SaleItem>> {
    let query = Select::all().filter(Filter::eq("product_id", product_id.to_string()));
    self.sale_items(query, "load product sales").await
  }

  // ─── Settings ─────────────────────────────────────────────────────────────

  /// The stored till settings, `None` until they are first saved.
  pub async fn get_pos_settings(&self) -> Result<Option<PosSettings>> {
    Ok(self.settings_row().await?.as_ref().map(normalize::pos_settings))
  }

  /// Merge `update` into the stored settings, creating the record with
  /// defaults for everything left out when there is none yet.
  pub async fn update_pos_settings(&self, session: &Session, update: PosSettingsUpdate) -> Result<PosSettings> {
    self.authorize(session)?;
    non_negative_price("tax rate", update.tax_rate)?;
    non_negative_quantity("stock threshold", update.stock_threshold)?;

    let currency = self.config.base_currency.as_str();
    let row = match self.settings_row().await? {
      Some(current) => {
        let patch = normalize::pos_settings_row(&update, false, currency);
        self
          .update_one(table::POS_SETTINGS, Fields::new(&current).id(), patch, "update settings", "settings")
          .await?
      }
      None => {
        let row = normalize::pos_settings_row(&update, true, currency);
        self
          .insert_one(table::POS_SETTINGS, row, "create settings", "settings")
          .await?
      }
    };
    let settings = normalize::pos_settings(&row);
    info!(settings_id = %settings.id, "till settings saved");
    self.emit("settings.updated", &settings);
    Ok(settings)
  }

  // ─── Internals ────────────────────────────────────────────────────────────

  async fn sale_items(&self, query: Select, context: &'static str) -> Result<Vec<SaleItem>> {
    let query = query.order_by("created_at", Direction::Desc);
    let rows = self
      .store
      .select(table::SALE_ITEMS, &query)
      .await
      .remote(context)?;
    Ok(rows.rows.iter().map(normalize::sale_item).collect())
  }

  async fn settings_row(&self) -> Result<Option<Row>> {
    let query = Select::all().order_by("created_at", Direction::Asc).range(0, 1);
    let rows = self
      .store
      .select(table::POS_SETTINGS, &query)
      .await
      .remote("load settings")?;
    Ok(rows.rows.into_iter().next())
  }

  async fn cart_row(&self, user_id: &str) -> Result<Option<Row>> {
    let query = Select::all().filter(Filter::eq("user_id", user_id)).range(0, 1);
    let rows = self
      .store
      .select(table::CARTS, &query)
      .await
      .remote("load cart")?;
    Ok(rows.rows.into_iter().next())
  }

  async fn cart_items(&self, cart_id: Uuid) -> Result<Vec<Row>> {
    let query = Select::all()
      .filter(Filter::eq("cart_id", cart_id.to_string()))
      .order_by("created_at", Direction::Asc);
    let rows = self
      .store
      .select(table::CART_ITEMS, &query)
      .await
      .remote("load cart items")?;
    Ok(rows.rows)
  }

  /// Only lines of the caller's own cart may be changed.
  async fn own_cart_item(&self, session: &Session, item_id: Uuid) -> Result<()> {
    let item = self
      .find_row(table::CART_ITEMS, item_id, "load cart item")
      .await?
      .ok_or(Error::NotFound("cart item"))?;
    let cart = self.cart_row(&session.user_id).await?;
    let owned = cart.is_some_and(|c| Some(Fields::new(&c).id()) == Fields::new(&item).uuid("cart_id"));
    if owned { Ok(()) } else { Err(Error::NotFound("cart item")) }
  }
}
