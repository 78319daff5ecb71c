//! [`SqliteStore`], the SQLite implementation of [`ShopStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use shelf_core::{
  account::User,
  address::{Address, AddressFields},
  cart::{Cart, CartReplace, CartWrite, MergedCart, NewCartLine},
  order::{NewOrder, Order, OrderInsert, OrderStatus},
  store::ShopStore,
};

use crate::{
  Result,
  encode::{
    RawAddress, RawCart, RawCartLine, RawOrder, RawOrderLine, RawUser, encode_dt,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Shelf store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ─────────────────────────────

type CartRows = (RawCart, Vec<RawCartLine>);
type OrderRows = (RawOrder, Vec<RawOrderLine>);

fn read_cart(conn: &Connection, cart_id: &str) -> rusqlite::Result<Option<CartRows>> {
  let Some(cart) = conn
    .query_row(
      &format!("SELECT {} FROM carts WHERE cart_id = ?1", RawCart::COLUMNS),
      rusqlite::params![cart_id],
      RawCart::from_row,
    )
    .optional()?
  else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM cart_lines WHERE cart_id = ?1 ORDER BY position",
    RawCartLine::COLUMNS
  ))?;
  let lines = stmt
    .query_map(rusqlite::params![cart_id], RawCartLine::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some((cart, lines)))
}

fn read_order_lines(conn: &Connection, order_id: &str) -> rusqlite::Result<Vec<RawOrderLine>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM order_lines WHERE order_id = ?1 ORDER BY position",
    RawOrderLine::COLUMNS
  ))?;
  let lines = stmt
    .query_map(rusqlite::params![order_id], RawOrderLine::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(lines)
}

/// Look up one order by a unique column (`order_id` or
/// `payment_session_ref`).
fn read_order(
  conn: &Connection,
  column: &'static str,
  key: &str,
) -> rusqlite::Result<Option<OrderRows>> {
  let Some(order) = conn
    .query_row(
      &format!("SELECT {} FROM orders WHERE {column} = ?1", RawOrder::COLUMNS),
      rusqlite::params![key],
      RawOrder::from_row,
    )
    .optional()?
  else {
    return Ok(None);
  };
  let lines = read_order_lines(conn, &order.order_id)?;
  Ok(Some((order, lines)))
}

fn insert_cart_lines(
  conn: &Connection,
  cart_id: &str,
  lines: &[(String, NewCartLine)],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(
    "INSERT INTO cart_lines (
       line_id, cart_id, position, variant_id, variant_name, price,
       product_id, product_slug, product_name, image, quantity
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
  )?;
  for (position, (line_id, line)) in lines.iter().enumerate() {
    let v = &line.variant;
    stmt.execute(rusqlite::params![
      line_id,
      cart_id,
      position as i64,
      v.variant_id,
      v.name,
      v.price,
      v.product.product_id,
      v.product.slug,
      v.product.name,
      v.image,
      i64::from(line.quantity),
    ])?;
  }
  Ok(())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

fn into_orders(rows: Vec<OrderRows>) -> Result<Vec<Order>> {
  rows
    .into_iter()
    .map(|(order, lines)| order.into_order(lines))
    .collect()
}

enum RawOrderInsert {
  Created(OrderRows),
  Duplicate(OrderRows),
}

// ─── ShopStore impl ──────────────────────────────────────────────────────────

impl ShopStore for SqliteStore {
  type Error = crate::Error;

  // ── Carts ─────────────────────────────────────────────────────────────────

  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    let id_str = encode_uuid(cart_id);

    let raw = self
      .conn
      .call(move |conn| Ok(read_cart(conn, &id_str)?))
      .await?;

    raw.map(|(cart, lines)| cart.into_cart(lines)).transpose()
  }

  async fn replace_cart_lines(&self, write: CartWrite) -> Result<CartReplace> {
    let requested_id = write.cart_id.map(encode_uuid);
    let new_id       = encode_uuid(Uuid::new_v4());
    let owner_str    = write.owner_id.map(encode_uuid);
    let expected     = write.expected_revision;
    let now_str      = encode_dt(Utc::now());
    let lines: Vec<(String, NewCartLine)> = write
      .lines
      .into_iter()
      .map(|line| (encode_uuid(Uuid::new_v4()), line))
      .collect();

    let outcome: Option<(CartRows, bool)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<i64> = match &requested_id {
          Some(id) => tx
            .query_row(
              "SELECT revision FROM carts WHERE cart_id = ?1",
              rusqlite::params![id],
              |r| r.get(0),
            )
            .optional()?,
          None => None,
        };

        let (cart_id, created) = match (requested_id, current) {
          (Some(id), Some(revision)) => {
            if expected.is_some_and(|e| e != revision) {
              // Dropping the transaction rolls it back.
              return Ok(None);
            }
            tx.execute(
              "UPDATE carts SET revision = revision + 1, updated_at = ?2 WHERE cart_id = ?1",
              rusqlite::params![id, now_str],
            )?;
            tx.execute("DELETE FROM cart_lines WHERE cart_id = ?1", rusqlite::params![id])?;
            (id, false)
          }
          // No id, or an id that does not resolve: start a fresh cart.
          _ => {
            tx.execute(
              "INSERT INTO carts (cart_id, owner_id, revision, created_at, updated_at)
               VALUES (?1, ?2, 1, ?3, ?3)",
              rusqlite::params![new_id, owner_str, now_str],
            )?;
            (new_id, true)
          }
        };

        insert_cart_lines(&tx, &cart_id, &lines)?;
        let rows = read_cart(&tx, &cart_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Some((rows, created)))
      })
      .await?;

    match outcome {
      Some(((cart, lines), created)) => Ok(CartReplace::Replaced(MergedCart {
        cart: cart.into_cart(lines)?,
        created,
      })),
      None => Ok(CartReplace::Stale),
    }
  }

  // ── Addresses ─────────────────────────────────────────────────────────────

  async fn list_addresses(&self, owner: Uuid) -> Result<Vec<Address>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawAddress> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM addresses WHERE owner_id = ?1
           ORDER BY created_at DESC, rowid DESC",
          RawAddress::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawAddress::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAddress::into_address).collect()
  }

  async fn add_address(
    &self,
    owner:        Uuid,
    fields:       AddressFields,
    make_default: bool,
  ) -> Result<Address> {
    let address = Address {
      address_id: Uuid::new_v4(),
      owner_id:   owner,
      fields,
      is_default: make_default,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(address.address_id);
    let owner_str = encode_uuid(owner);
    let at_str    = encode_dt(address.created_at);
    let f         = address.fields.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Clear before insert so the new default never coexists with the old.
        if make_default {
          tx.execute(
            "UPDATE addresses SET is_default = 0 WHERE owner_id = ?1 AND is_default = 1",
            rusqlite::params![owner_str],
          )?;
        }
        tx.execute(
          "INSERT INTO addresses (
             address_id, owner_id, name, street, city, state, zip, country,
             is_default, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            owner_str,
            f.name,
            f.street,
            f.city,
            f.state,
            f.zip,
            f.country,
            make_default,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(address)
  }

  async fn delete_address(&self, owner: Uuid, address_id: Uuid) -> Result<bool> {
    let id_str    = encode_uuid(address_id);
    let owner_str = encode_uuid(owner);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM addresses WHERE address_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn set_default_address(&self, owner: Uuid, address_id: Uuid) -> Result<bool> {
    let id_str    = encode_uuid(address_id);
    let owner_str = encode_uuid(owner);

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "UPDATE addresses SET is_default = 0 WHERE owner_id = ?1 AND is_default = 1",
          rusqlite::params![owner_str],
        )?;
        let set = tx.execute(
          "UPDATE addresses SET is_default = 1 WHERE address_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?;
        if set == 0 {
          // Not this owner's address: roll back so the old default survives.
          return Ok(false);
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(updated)
  }

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let id_str = encode_uuid(order_id);

    let raw = self
      .conn
      .call(move |conn| Ok(read_order(conn, "order_id", &id_str)?))
      .await?;

    raw.map(|(order, lines)| order.into_order(lines)).transpose()
  }

  async fn get_order_by_payment_session(&self, payment_session_ref: &str) -> Result<Option<Order>> {
    let key = payment_session_ref.to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(read_order(conn, "payment_session_ref", &key)?))
      .await?;

    raw.map(|(order, lines)| order.into_order(lines)).transpose()
  }

  async fn insert_order(&self, order: NewOrder) -> Result<OrderInsert> {
    let order_id_str = encode_uuid(Uuid::new_v4());
    let owner_str    = order.owner_id.map(encode_uuid);
    let status_str   = encode_status(OrderStatus::Paid);
    let at_str       = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(existing) = read_order(&tx, "payment_session_ref", &order.payment_session_ref)? {
          return Ok(RawOrderInsert::Duplicate(existing));
        }

        let s = &order.shipping;
        let inserted = tx.execute(
          "INSERT INTO orders (
             order_id, owner_id, payment_session_ref, amount_total, currency, status,
             shipping_name, shipping_line1, shipping_line2, shipping_city,
             shipping_state, shipping_postal_code, shipping_country, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            order_id_str,
            owner_str,
            order.payment_session_ref,
            order.amount_total,
            order.currency,
            status_str,
            s.name,
            s.line1,
            s.line2,
            s.city,
            s.state,
            s.postal_code,
            s.country,
            at_str,
          ],
        );
        match inserted {
          Ok(_) => {}
          // Another connection committed the same session in the meantime.
          Err(e) if is_unique_violation(&e) => {
            drop(tx);
            let existing = read_order(conn, "payment_session_ref", &order.payment_session_ref)?
              .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            return Ok(RawOrderInsert::Duplicate(existing));
          }
          Err(e) => return Err(e.into()),
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO order_lines (
               order_id, position, product_id, variant_id, name, variant_name,
               price, quantity, image
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for (position, line) in order.lines.iter().enumerate() {
            stmt.execute(rusqlite::params![
              order_id_str,
              position as i64,
              line.product_id,
              line.variant_id,
              line.name,
              line.variant_name,
              line.price,
              i64::from(line.quantity),
              line.image,
            ])?;
          }
        }

        let created = read_order(&tx, "order_id", &order_id_str)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(RawOrderInsert::Created(created))
      })
      .await?;

    Ok(match outcome {
      RawOrderInsert::Created((order, lines)) => OrderInsert::Created(order.into_order(lines)?),
      RawOrderInsert::Duplicate((order, lines)) => {
        OrderInsert::Duplicate(order.into_order(lines)?)
      }
    })
  }

  async fn list_orders(&self, owner: Uuid) -> Result<Vec<Order>> {
    let owner_str = encode_uuid(owner);

    let rows: Vec<OrderRows> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM orders WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
          RawOrder::COLUMNS
        ))?;
        let orders = stmt
          .query_map(rusqlite::params![owner_str], RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(orders.len());
        for order in orders {
          let lines = read_order_lines(conn, &order.order_id)?;
          rows.push((order, lines));
        }
        Ok(rows)
      })
      .await?;

    into_orders(rows)
  }

  // ── Owners ────────────────────────────────────────────────────────────────

  async fn add_user(&self, password_hash: Option<String>) -> Result<User> {
    let user = User {
      user_id: Uuid::new_v4(),
      password_hash,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let hash_str = user.password_hash.clone();
    let at_str   = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, password_hash, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, hash_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn set_password_hash(&self, user_id: Uuid, password_hash: String) -> Result<bool> {
    let id_str = encode_uuid(user_id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?)
      })
      .await?;

    Ok(updated > 0)
  }
}
