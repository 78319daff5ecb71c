//! Handlers for `/account/orders` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/account/orders` | The caller's orders, newest first |
//! | `GET`  | `/account/orders/{id}` | 404 if missing or not the caller's |

use axum::{
  Json,
  extract::{Path, State},
};
use shelf_core::{catalog::Catalog, order::Order, store::ShopStore};
use uuid::Uuid;

use crate::{ApiState, caller::Owner, error::ApiError};

/// `GET /account/orders`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
) -> Result<Json<Vec<Order>>, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let orders = state
    .store
    .list_orders(owner)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(orders))
}

/// `GET /account/orders/{id}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let order = state
    .store
    .get_order(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|o| o.owner_id == Some(owner))
    .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
  Ok(Json(order))
}
