//! Cart types and the pure line-list transformations behind add, remove and
//! set-quantity.
//!
//! A cart line is a snapshot of catalog data taken when the line was last
//! merged. Later catalog changes never reach an existing line. The cart total
//! is not stored anywhere; it is derived from the lines on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, catalog::VariantRecord, validation::FieldErrors};

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// Product fields copied onto a cart or order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
  pub product_id: String,
  pub slug:       String,
  pub name:       String,
}

/// Variant fields copied onto a cart line, with the parent product nested by
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSnapshot {
  pub variant_id: String,
  pub name:       String,
  /// Unit price in minor currency units at merge time.
  pub price:      i64,
  /// Single representative image: the variant's, else the product's.
  pub image:      Option<String>,
  pub product:    ProductSnapshot,
}

impl From<VariantRecord> for VariantSnapshot {
  fn from(r: VariantRecord) -> Self {
    VariantSnapshot {
      variant_id: r.variant_id,
      name:       r.variant_name,
      price:      r.price,
      image:      r.image.or(r.product_image),
      product:    ProductSnapshot {
        product_id: r.product_id,
        slug:       r.product_slug,
        name:       r.product_name,
      },
    }
  }
}

// ─── Cart ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub line_id:  Uuid,
  /// Always positive; non-positive requests remove the line instead.
  pub quantity: u32,
  pub variant:  VariantSnapshot,
}

impl CartLine {
  pub fn line_total(&self) -> i64 { self.variant.price.saturating_mul(i64::from(self.quantity)) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  pub cart_id:    Uuid,
  /// `None` for guest carts.
  pub owner_id:   Option<Uuid>,
  /// Bumped on every merge; used to detect concurrent read-modify-write.
  pub revision:   i64,
  pub lines:      Vec<CartLine>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  /// Sum of `price × quantity` over the current lines.
  pub fn total_amount(&self) -> i64 {
    self
      .lines
      .iter()
      .map(CartLine::line_total)
      .fold(0, i64::saturating_add)
  }

  pub fn item_count(&self) -> u64 {
    self.lines.iter().map(|l| u64::from(l.quantity)).sum()
  }

  /// The current lines expressed as merge requests, in display order.
  pub fn line_requests(&self) -> Vec<LineRequest> {
    self
      .lines
      .iter()
      .map(|l| LineRequest::new(l.variant.variant_id.clone(), i64::from(l.quantity)))
      .collect()
  }

  pub fn view(&self) -> CartView<'_> {
    CartView {
      cart:         self,
      total_amount: self.total_amount(),
      item_count:   self.item_count(),
    }
  }
}

/// Read-time projection of a cart with its derived totals.
#[derive(Debug, Serialize)]
pub struct CartView<'a> {
  #[serde(flatten)]
  pub cart:         &'a Cart,
  pub total_amount: i64,
  pub item_count:   u64,
}

// ─── Merge input ─────────────────────────────────────────────────────────────

/// One desired `(variant, quantity)` pair as submitted by the caller. Any
/// integer is accepted; the merge decides what survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
  pub variant_id: String,
  pub quantity:   i64,
}

impl LineRequest {
  pub fn new(variant_id: impl Into<String>, quantity: i64) -> Self {
    Self { variant_id: variant_id.into(), quantity }
  }
}

/// A line ready to be written: quantity validated, catalog data captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
  pub quantity: u32,
  pub variant:  VariantSnapshot,
}

/// Input to [`crate::store::ShopStore::replace_cart_lines`].
#[derive(Debug, Clone)]
pub struct CartWrite {
  /// Target cart. `None`, or an id that does not resolve, creates a new cart.
  pub cart_id:           Option<Uuid>,
  /// Recorded on newly created carts only.
  pub owner_id:          Option<Uuid>,
  /// When set, the write is abandoned if the cart's revision has moved on.
  pub expected_revision: Option<i64>,
  pub lines:             Vec<NewCartLine>,
}

/// Result of a successful merge.
#[derive(Debug, Clone)]
pub struct MergedCart {
  pub cart:    Cart,
  /// `true` if the merge had to create a new cart; the caller must hand the
  /// new id back to the client.
  pub created: bool,
}

/// Outcome of [`crate::store::ShopStore::replace_cart_lines`].
#[derive(Debug, Clone)]
pub enum CartReplace {
  Replaced(MergedCart),
  /// `expected_revision` did not match; nothing was written.
  Stale,
}

// ─── Line-list transformations ──────────────────────────────────────────────

/// Collapse repeated variants (first position wins, quantities summed), then
/// drop every line whose quantity is not positive.
pub fn normalize_lines(requested: Vec<LineRequest>) -> Result<Vec<(String, u32)>> {
  let mut merged: Vec<(String, i64)> = Vec::with_capacity(requested.len());
  for line in requested {
    match merged.iter_mut().find(|(id, _)| *id == line.variant_id) {
      Some((_, qty)) => *qty = qty.saturating_add(line.quantity),
      None => merged.push((line.variant_id, line.quantity)),
    }
  }

  let mut errors = FieldErrors::new();
  let lines: Vec<(String, u32)> = merged
    .into_iter()
    .filter(|(_, qty)| *qty > 0)
    .filter_map(|(id, qty)| match u32::try_from(qty) {
      Ok(q) => Some((id, q)),
      Err(_) => {
        errors.add("quantity", format!("quantity for {id} is too large"));
        None
      }
    })
    .collect();
  errors.into_result()?;
  Ok(lines)
}

/// Add `quantity` of a variant, accumulating onto an existing line.
pub fn add_line(mut lines: Vec<LineRequest>, variant_id: &str, quantity: i64) -> Vec<LineRequest> {
  match lines.iter_mut().find(|l| l.variant_id == variant_id) {
    Some(line) => line.quantity = line.quantity.saturating_add(quantity),
    None => lines.push(LineRequest::new(variant_id, quantity)),
  }
  lines
}

pub fn remove_line(mut lines: Vec<LineRequest>, variant_id: &str) -> Vec<LineRequest> {
  lines.retain(|l| l.variant_id != variant_id);
  lines
}

/// Replace a variant's quantity; a non-positive quantity removes it and an
/// absent variant is appended.
pub fn set_line_quantity(
  lines: Vec<LineRequest>,
  variant_id: &str,
  quantity: i64,
) -> Vec<LineRequest> {
  if quantity <= 0 {
    return remove_line(lines, variant_id);
  }
  let mut lines = lines;
  match lines.iter_mut().find(|l| l.variant_id == variant_id) {
    Some(line) => line.quantity = quantity,
    None => lines.push(LineRequest::new(variant_id, quantity)),
  }
  lines
}
