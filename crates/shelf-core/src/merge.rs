//! The cart merge engine.
//!
//! A merge always replaces a cart's full line set: every requested variant is
//! resolved against the catalog, snapshotted, and written in one transaction
//! that first deletes all existing lines. There is no incremental update. The
//! add, remove and set-quantity flows are read-modify-write cycles on top of
//! it: read the cart, compute the complete desired line list, merge.
//!
//! Catalog resolution finishes before the store is touched, so a missing
//! variant aborts the merge with nothing written.

use uuid::Uuid;

use crate::{
  Error, Result,
  cart::{
    Cart, CartReplace, CartWrite, LineRequest, MergedCart, NewCartLine, VariantSnapshot,
    add_line, normalize_lines, remove_line, set_line_quantity,
  },
  catalog::Catalog,
  store::ShopStore,
  validation::FieldErrors,
};

/// How many times a read-modify-write edit is retried after losing a race
/// with another edit of the same cart.
pub const MAX_EDIT_ATTEMPTS: usize = 3;

/// Read a cart. A missing id, or one that does not resolve, yields `None`.
pub async fn get_cart<S: ShopStore>(store: &S, cart_id: Option<Uuid>) -> Result<Option<Cart>> {
  match cart_id {
    Some(id) => store.get_cart(id).await.map_err(Error::store),
    None => Ok(None),
  }
}

/// Replace the lines of `cart_id` with `requested`.
///
/// Lines with a non-positive quantity are dropped. A missing or unknown
/// `cart_id` creates a new cart owned by `owner` (if any); the returned
/// [`MergedCart::created`] flag tells the caller to persist the new id.
pub async fn upsert_cart<S, C>(
  store: &S,
  catalog: &C,
  cart_id: Option<Uuid>,
  owner: Option<Uuid>,
  requested: Vec<LineRequest>,
) -> Result<MergedCart>
where
  S: ShopStore,
  C: Catalog,
{
  let lines = snapshot_lines(catalog, requested).await?;
  let write = CartWrite { cart_id, owner_id: owner, expected_revision: None, lines };
  match store.replace_cart_lines(write).await.map_err(Error::store)? {
    CartReplace::Replaced(merged) => Ok(log_merge(merged)),
    // Unreachable without an expected revision, but never silently succeed.
    CartReplace::Stale => Err(Error::CartConflict(cart_id.unwrap_or_default())),
  }
}

/// Add `quantity` of `variant_id`, accumulating onto an existing line.
/// Creates the cart if it does not exist.
pub async fn add_to_cart<S, C>(
  store: &S,
  catalog: &C,
  cart_id: Option<Uuid>,
  owner: Option<Uuid>,
  variant_id: &str,
  quantity: i64,
) -> Result<MergedCart>
where
  S: ShopStore,
  C: Catalog,
{
  edit_cart(store, catalog, cart_id, owner, true, |lines| {
    add_line(lines, variant_id, quantity)
  })
  .await
}

/// Remove every unit of `variant_id`. The cart must exist.
pub async fn remove_from_cart<S, C>(
  store: &S,
  catalog: &C,
  cart_id: Uuid,
  variant_id: &str,
) -> Result<MergedCart>
where
  S: ShopStore,
  C: Catalog,
{
  edit_cart(store, catalog, Some(cart_id), None, false, |lines| {
    remove_line(lines, variant_id)
  })
  .await
}

/// Set the quantity of `variant_id`; zero or less removes it. The cart must
/// exist.
pub async fn set_cart_quantity<S, C>(
  store: &S,
  catalog: &C,
  cart_id: Uuid,
  variant_id: &str,
  quantity: i64,
) -> Result<MergedCart>
where
  S: ShopStore,
  C: Catalog,
{
  edit_cart(store, catalog, Some(cart_id), None, false, |lines| {
    set_line_quantity(lines, variant_id, quantity)
  })
  .await
}

// ─── Internals ───────────────────────────────────────────────────────────────

/// Resolve and snapshot every surviving requested line, in request order.
async fn snapshot_lines<C: Catalog>(
  catalog: &C,
  requested: Vec<LineRequest>,
) -> Result<Vec<NewCartLine>> {
  let normalized = normalize_lines(requested)?;
  let mut lines = Vec::with_capacity(normalized.len());
  let mut errors = FieldErrors::new();
  let mut total = 0i64;
  for (variant_id, quantity) in normalized {
    let record = catalog
      .get_variant(&variant_id)
      .await
      .map_err(Error::catalog)?
      .ok_or(Error::VariantNotFound(variant_id))?;
    let variant = VariantSnapshot::from(record);

    // The cart total must stay representable.
    match variant
      .price
      .checked_mul(i64::from(quantity))
      .and_then(|line| total.checked_add(line))
    {
      Some(t) => total = t,
      None => errors.add(
        "quantity",
        format!("quantity for {} is too large", variant.variant_id),
      ),
    }
    lines.push(NewCartLine { quantity, variant });
  }
  errors.into_result()?;
  Ok(lines)
}

/// Read-modify-write with an optimistic revision check. If another merge
/// commits between our read and our write, the edit is recomputed from the
/// fresh cart.
async fn edit_cart<S, C, F>(
  store: &S,
  catalog: &C,
  cart_id: Option<Uuid>,
  owner: Option<Uuid>,
  create_missing: bool,
  edit: F,
) -> Result<MergedCart>
where
  S: ShopStore,
  C: Catalog,
  F: Fn(Vec<LineRequest>) -> Vec<LineRequest>,
{
  for attempt in 1..=MAX_EDIT_ATTEMPTS {
    let current = get_cart(store, cart_id).await?;
    let (requested, expected_revision) = match (current, cart_id) {
      (Some(cart), _) => (edit(cart.line_requests()), Some(cart.revision)),
      (None, Some(id)) if !create_missing => return Err(Error::CartNotFound(id)),
      (None, _) => (edit(Vec::new()), None),
    };

    let lines = snapshot_lines(catalog, requested).await?;
    let write = CartWrite { cart_id, owner_id: owner, expected_revision, lines };
    match store.replace_cart_lines(write).await.map_err(Error::store)? {
      CartReplace::Replaced(merged) => return Ok(log_merge(merged)),
      CartReplace::Stale => {
        tracing::warn!(?cart_id, attempt, "cart changed during edit, retrying");
      }
    }
  }
  Err(Error::CartConflict(cart_id.unwrap_or_default()))
}

fn log_merge(merged: MergedCart) -> MergedCart {
  if merged.created {
    tracing::info!(cart_id = %merged.cart.cart_id, "created cart");
  }
  tracing::debug!(
    cart_id = %merged.cart.cart_id,
    lines = merged.cart.lines.len(),
    revision = merged.cart.revision,
    "merged cart"
  );
  merged
}
