//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that they sort correctly as text. UUIDs are stored as hyphenated
//! lowercase strings. Money is stored as INTEGER minor units.

use chrono::{DateTime, SecondsFormat, Utc};
use shelf_core::{
  account::User,
  address::{Address, AddressFields},
  cart::{Cart, CartLine, ProductSnapshot, VariantSnapshot},
  order::{Order, OrderLine, OrderStatus, ShippingSnapshot},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> { s.map(decode_uuid).transpose() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── OrderStatus ─────────────────────────────────────────────────────────────

pub fn encode_status(s: OrderStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<OrderStatus> {
  match s {
    "paid" => Ok(OrderStatus::Paid),
    other => Err(Error::InvalidValue(format!("unknown order status: {other:?}"))),
  }
}

// ─── Quantities ──────────────────────────────────────────────────────────────

fn decode_quantity(q: i64) -> Result<u32> {
  u32::try_from(q).map_err(|_| Error::InvalidValue(format!("quantity out of range: {q}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `carts` row.
pub struct RawCart {
  pub cart_id:    String,
  pub owner_id:   Option<String>,
  pub revision:   i64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawCart {
  pub const COLUMNS: &'static str = "cart_id, owner_id, revision, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawCart {
      cart_id:    row.get(0)?,
      owner_id:   row.get(1)?,
      revision:   row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  pub fn into_cart(self, lines: Vec<RawCartLine>) -> Result<Cart> {
    Ok(Cart {
      cart_id:    decode_uuid(&self.cart_id)?,
      owner_id:   decode_opt_uuid(self.owner_id.as_deref())?,
      revision:   self.revision,
      lines:      lines
        .into_iter()
        .map(RawCartLine::into_line)
        .collect::<Result<_>>()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `cart_lines` row.
pub struct RawCartLine {
  pub line_id:      String,
  pub variant_id:   String,
  pub variant_name: String,
  pub price:        i64,
  pub product_id:   String,
  pub product_slug: String,
  pub product_name: String,
  pub image:        Option<String>,
  pub quantity:     i64,
}

impl RawCartLine {
  pub const COLUMNS: &'static str = "line_id, variant_id, variant_name, price, product_id, \
                                     product_slug, product_name, image, quantity";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawCartLine {
      line_id:      row.get(0)?,
      variant_id:   row.get(1)?,
      variant_name: row.get(2)?,
      price:        row.get(3)?,
      product_id:   row.get(4)?,
      product_slug: row.get(5)?,
      product_name: row.get(6)?,
      image:        row.get(7)?,
      quantity:     row.get(8)?,
    })
  }

  fn into_line(self) -> Result<CartLine> {
    Ok(CartLine {
      line_id:  decode_uuid(&self.line_id)?,
      quantity: decode_quantity(self.quantity)?,
      variant:  VariantSnapshot {
        variant_id: self.variant_id,
        name:       self.variant_name,
        price:      self.price,
        image:      self.image,
        product:    ProductSnapshot {
          product_id: self.product_id,
          slug:       self.product_slug,
          name:       self.product_name,
        },
      },
    })
  }
}

/// Raw values read directly from an `addresses` row.
pub struct RawAddress {
  pub address_id: String,
  pub owner_id:   String,
  pub name:       String,
  pub street:     String,
  pub city:       String,
  pub state:      String,
  pub zip:        String,
  pub country:    String,
  pub is_default: bool,
  pub created_at: String,
}

impl RawAddress {
  pub const COLUMNS: &'static str =
    "address_id, owner_id, name, street, city, state, zip, country, is_default, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAddress {
      address_id: row.get(0)?,
      owner_id:   row.get(1)?,
      name:       row.get(2)?,
      street:     row.get(3)?,
      city:       row.get(4)?,
      state:      row.get(5)?,
      zip:        row.get(6)?,
      country:    row.get(7)?,
      is_default: row.get(8)?,
      created_at: row.get(9)?,
    })
  }

  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      address_id: decode_uuid(&self.address_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      fields:     AddressFields {
        name:    self.name,
        street:  self.street,
        city:    self.city,
        state:   self.state,
        zip:     self.zip,
        country: self.country,
      },
      is_default: self.is_default,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `orders` row.
pub struct RawOrder {
  pub order_id:            String,
  pub owner_id:            Option<String>,
  pub payment_session_ref: String,
  pub amount_total:        i64,
  pub currency:            String,
  pub status:              String,
  pub shipping:            ShippingSnapshot,
  pub created_at:          String,
}

impl RawOrder {
  pub const COLUMNS: &'static str = "order_id, owner_id, payment_session_ref, amount_total, \
                                     currency, status, shipping_name, shipping_line1, \
                                     shipping_line2, shipping_city, shipping_state, \
                                     shipping_postal_code, shipping_country, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawOrder {
      order_id:            row.get(0)?,
      owner_id:            row.get(1)?,
      payment_session_ref: row.get(2)?,
      amount_total:        row.get(3)?,
      currency:            row.get(4)?,
      status:              row.get(5)?,
      shipping:            ShippingSnapshot {
        name:        row.get(6)?,
        line1:       row.get(7)?,
        line2:       row.get(8)?,
        city:        row.get(9)?,
        state:       row.get(10)?,
        postal_code: row.get(11)?,
        country:     row.get(12)?,
      },
      created_at:          row.get(13)?,
    })
  }

  pub fn into_order(self, lines: Vec<RawOrderLine>) -> Result<Order> {
    Ok(Order {
      order_id:            decode_uuid(&self.order_id)?,
      owner_id:            decode_opt_uuid(self.owner_id.as_deref())?,
      payment_session_ref: self.payment_session_ref,
      amount_total:        self.amount_total,
      currency:            self.currency,
      status:              decode_status(&self.status)?,
      shipping:            self.shipping,
      lines:               lines
        .into_iter()
        .map(RawOrderLine::into_line)
        .collect::<Result<_>>()?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `order_lines` row.
pub struct RawOrderLine {
  pub product_id:   String,
  pub variant_id:   String,
  pub name:         String,
  pub variant_name: String,
  pub price:        i64,
  pub quantity:     i64,
  pub image:        Option<String>,
}

impl RawOrderLine {
  pub const COLUMNS: &'static str =
    "product_id, variant_id, name, variant_name, price, quantity, image";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawOrderLine {
      product_id:   row.get(0)?,
      variant_id:   row.get(1)?,
      name:         row.get(2)?,
      variant_name: row.get(3)?,
      price:        row.get(4)?,
      quantity:     row.get(5)?,
      image:        row.get(6)?,
    })
  }

  fn into_line(self) -> Result<OrderLine> {
    Ok(OrderLine {
      product_id:   self.product_id,
      variant_id:   self.variant_id,
      name:         self.name,
      variant_name: self.variant_name,
      price:        self.price,
      quantity:     decode_quantity(self.quantity)?,
      image:        self.image,
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub password_hash: Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, password_hash, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:       row.get(0)?,
      password_hash: row.get(1)?,
      created_at:    row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
