//! Saved postal addresses and the single-default rule.
//!
//! At most one address per owner carries `is_default`. The rule is held by
//! the store: clearing the old default and setting the new one always happen
//! in the same transaction, so no reader ever sees two defaults. These
//! functions validate input and turn "zero rows touched" into
//! [`Error::AddressNotFound`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::ShopStore, validation::FieldErrors};

/// The postal fields of an address, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFields {
  /// Recipient name.
  pub name:    String,
  pub street:  String,
  pub city:    String,
  pub state:   String,
  pub zip:     String,
  pub country: String,
}

impl AddressFields {
  /// Check that every field is present and return the trimmed fields.
  pub fn validated(self) -> Result<Self> {
    let mut errors = FieldErrors::new();
    errors.require("name", &self.name, "Name is required");
    errors.require("street", &self.street, "Street address is required");
    errors.require("city", &self.city, "City is required");
    errors.require("state", &self.state, "State is required");
    errors.require("zip", &self.zip, "ZIP code is required");
    errors.require("country", &self.country, "Country is required");
    errors.into_result()?;

    Ok(Self {
      name:    self.name.trim().to_owned(),
      street:  self.street.trim().to_owned(),
      city:    self.city.trim().to_owned(),
      state:   self.state.trim().to_owned(),
      zip:     self.zip.trim().to_owned(),
      country: self.country.trim().to_owned(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub address_id: Uuid,
  pub owner_id:   Uuid,
  #[serde(flatten)]
  pub fields:     AddressFields,
  pub is_default: bool,
  pub created_at: DateTime<Utc>,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Save a new address for `owner`. With `make_default` the owner's previous
/// default is cleared first, in the same transaction as the insert.
pub async fn add_address<S: ShopStore>(
  store: &S,
  owner: Uuid,
  fields: AddressFields,
  make_default: bool,
) -> Result<Address> {
  let fields = fields.validated()?;
  store
    .add_address(owner, fields, make_default)
    .await
    .map_err(Error::store)
}

/// Delete one of `owner`'s addresses. An id that exists but belongs to
/// someone else is reported exactly like a missing one.
pub async fn delete_address<S: ShopStore>(store: &S, owner: Uuid, address_id: Uuid) -> Result<()> {
  let deleted = store
    .delete_address(owner, address_id)
    .await
    .map_err(Error::store)?;
  if deleted {
    Ok(())
  } else {
    Err(Error::AddressNotFound(address_id))
  }
}

/// Move `owner`'s default flag to `address_id`. If the address is not the
/// owner's, nothing changes and the previous default stays in place.
pub async fn set_default_address<S: ShopStore>(
  store: &S,
  owner: Uuid,
  address_id: Uuid,
) -> Result<()> {
  let updated = store
    .set_default_address(owner, address_id)
    .await
    .map_err(Error::store)?;
  if updated {
    Ok(())
  } else {
    Err(Error::AddressNotFound(address_id))
  }
}

/// The owner's addresses, newest first.
pub async fn list_addresses<S: ShopStore>(store: &S, owner: Uuid) -> Result<Vec<Address>> {
  store.list_addresses(owner).await.map_err(Error::store)
}
