//! Handlers for `/account` endpoints. Everything except registration requires
//! the `x-shelf-owner` header.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/account/register` | Body: `{"password":"..."}` (optional) |
//! | `GET`    | `/account/addresses` | Newest first |
//! | `POST`   | `/account/addresses` | Body: address fields plus `is_default`; 422 with field errors |
//! | `DELETE` | `/account/addresses/{id}` | 404 if missing or not the caller's |
//! | `POST`   | `/account/addresses/{id}/default` | 404 if missing or not the caller's |
//! | `POST`   | `/account/password` | Body: `current_password`, `new_password`, `confirm_password` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use shelf_core::{
  account::{self, PasswordChange, User},
  address::{self, Address, AddressFields},
  catalog::Catalog,
  store::ShopStore,
};
use uuid::Uuid;

use crate::{ApiState, caller::Owner, error::ApiError};

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RegisterBody {
  pub password: Option<String>,
}

/// `POST /account/register`
pub async fn register<S, C>(
  State(state): State<ApiState<S, C>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let user: User =
    account::register_owner(&*state.store, &*state.hasher, body.password.as_deref()).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Addresses ───────────────────────────────────────────────────────────────

/// `GET /account/addresses`
pub async fn list_addresses<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
) -> Result<Json<Vec<Address>>, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  Ok(Json(address::list_addresses(&*state.store, owner).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddressBody {
  #[serde(flatten)]
  pub fields:     AddressFields,
  #[serde(default)]
  pub is_default: bool,
}

/// `POST /account/addresses`
pub async fn create_address<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
  Json(body): Json<AddressBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let created = address::add_address(&*state.store, owner, body.fields, body.is_default).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /account/addresses/{id}`
pub async fn delete_address<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  address::delete_address(&*state.store, owner, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /account/addresses/{id}/default`
pub async fn set_default_address<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  address::set_default_address(&*state.store, owner, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Password ────────────────────────────────────────────────────────────────

/// `POST /account/password`
pub async fn change_password<S, C>(
  State(state): State<ApiState<S, C>>,
  Owner(owner): Owner,
  Json(body): Json<PasswordChange>,
) -> Result<StatusCode, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  account::change_password(&*state.store, &*state.hasher, owner, body).await?;
  Ok(StatusCode::NO_CONTENT)
}
