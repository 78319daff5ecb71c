//! Handlers for `/cart` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/cart` | `null` when the cookie is absent or stale |
//! | `PUT`    | `/cart` | Body: `{"lines":[{"variant_id":"var_1","quantity":2}]}`; replaces every line |
//! | `POST`   | `/cart/lines` | Body: `{"variant_id":"var_1","quantity":1}`; adds onto an existing line |
//! | `PUT`    | `/cart/lines/{variant_id}` | Body: `{"quantity":3}`; zero removes |
//! | `DELETE` | `/cart/lines/{variant_id}` | |
//!
//! Every mutating route answers with the cart view and sets the `cart_id`
//! cookie whenever the cart id changed.

use axum::{
  Json,
  extract::{Path, State},
  response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use shelf_core::{
  cart::{Cart, LineRequest, MergedCart},
  catalog::Catalog,
  merge,
  store::ShopStore,
};
use uuid::Uuid;

use crate::{
  ApiState,
  caller::{Caller, cart_id_from, remember_cart},
  error::ApiError,
};

fn merged_response(jar: CookieJar, merged: MergedCart, inbound: Option<Uuid>) -> Response {
  let jar = remember_cart(jar, inbound, merged.cart.cart_id);
  (jar, Json(merged.cart.view())).into_response()
}

fn require_cart(jar: &CookieJar) -> Result<Uuid, ApiError> {
  cart_id_from(jar).ok_or_else(|| ApiError::NotFound("no cart".into()))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /cart`
pub async fn show<S, C>(
  State(state): State<ApiState<S, C>>,
  jar: CookieJar,
) -> Result<Response, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let cart = merge::get_cart(&*state.store, cart_id_from(&jar)).await?;
  Ok(Json(cart.as_ref().map(Cart::view)).into_response())
}

// ─── Replace ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReplaceBody {
  #[serde(default)]
  pub lines: Vec<LineRequest>,
}

/// `PUT /cart`
pub async fn replace<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  jar: CookieJar,
  Json(body): Json<ReplaceBody>,
) -> Result<Response, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let inbound = cart_id_from(&jar);
  let merged = merge::upsert_cart(
    &*state.store,
    &*state.catalog,
    inbound,
    caller.owner_id(),
    body.lines,
  )
  .await?;
  Ok(merged_response(jar, merged, inbound))
}

// ─── Line edits ──────────────────────────────────────────────────────────────

fn one() -> i64 { 1 }

#[derive(Debug, Deserialize)]
pub struct AddBody {
  pub variant_id: String,
  #[serde(default = "one")]
  pub quantity:   i64,
}

/// `POST /cart/lines`
pub async fn add_line<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  jar: CookieJar,
  Json(body): Json<AddBody>,
) -> Result<Response, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let inbound = cart_id_from(&jar);
  let merged = merge::add_to_cart(
    &*state.store,
    &*state.catalog,
    inbound,
    caller.owner_id(),
    &body.variant_id,
    body.quantity,
  )
  .await?;
  Ok(merged_response(jar, merged, inbound))
}

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
  pub quantity: i64,
}

/// `PUT /cart/lines/{variant_id}`
pub async fn set_quantity<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(variant_id): Path<String>,
  jar: CookieJar,
  Json(body): Json<QuantityBody>,
) -> Result<Response, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let cart_id = require_cart(&jar)?;
  let merged =
    merge::set_cart_quantity(&*state.store, &*state.catalog, cart_id, &variant_id, body.quantity)
      .await?;
  Ok(merged_response(jar, merged, Some(cart_id)))
}

/// `DELETE /cart/lines/{variant_id}`
pub async fn remove_line<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(variant_id): Path<String>,
  jar: CookieJar,
) -> Result<Response, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let cart_id = require_cart(&jar)?;
  let merged = merge::remove_from_cart(&*state.store, &*state.catalog, cart_id, &variant_id).await?;
  Ok(merged_response(jar, merged, Some(cart_id)))
}
