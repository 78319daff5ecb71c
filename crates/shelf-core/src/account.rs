//! Owner accounts and password changes.
//!
//! Hashing is delegated to a [`PasswordHasher`]; this module only decides
//! when a change is allowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::ShopStore, validation::FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A signed-up owner. Owners who only sign in through an external provider
/// have no password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  #[serde(skip_serializing)]
  pub password_hash: Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn has_password(&self) -> bool { self.password_hash.is_some() }
}

/// Password hashing capability supplied by the embedding application.
pub trait PasswordHasher: Send + Sync {
  /// Produce a self-describing hash string for `password`.
  fn hash(&self, password: &str) -> Result<String>;

  /// `Ok(false)` on mismatch; `Err` only if `hash` cannot be interpreted.
  fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Form input for [`change_password`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordChange {
  pub current_password: String,
  pub new_password:     String,
  pub confirm_password: String,
}

impl PasswordChange {
  fn validate(&self) -> Result<()> {
    let mut errors = FieldErrors::new();
    if self.current_password.is_empty() {
      errors.add("current_password", "Current password is required");
    }
    if self.new_password.chars().count() < MIN_PASSWORD_LEN {
      errors.add(
        "new_password",
        format!("New password must be at least {MIN_PASSWORD_LEN} characters"),
      );
    }
    if self.confirm_password.is_empty() {
      errors.add("confirm_password", "Confirm password is required");
    } else if self.confirm_password != self.new_password {
      errors.add("confirm_password", "Passwords do not match");
    }
    errors.into_result()
  }
}

/// Create an owner account, optionally with a password.
pub async fn register_owner<S: ShopStore>(
  store: &S,
  hasher: &dyn PasswordHasher,
  password: Option<&str>,
) -> Result<User> {
  let hash = match password {
    Some(p) => {
      if p.chars().count() < MIN_PASSWORD_LEN {
        let mut errors = FieldErrors::new();
        errors.add(
          "password",
          format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
        return Err(Error::Validation(errors));
      }
      Some(hasher.hash(p)?)
    }
    None => None,
  };
  store.add_user(hash).await.map_err(Error::store)
}

/// Replace `owner`'s password after checking the current one.
pub async fn change_password<S: ShopStore>(
  store: &S,
  hasher: &dyn PasswordHasher,
  owner: Uuid,
  change: PasswordChange,
) -> Result<()> {
  change.validate()?;

  let user = store
    .get_user(owner)
    .await
    .map_err(Error::store)?
    .ok_or(Error::OwnerNotFound(owner))?;
  let current_hash = user.password_hash.ok_or(Error::NoPassword(owner))?;

  if !hasher.verify(&change.current_password, &current_hash)? {
    return Err(Error::IncorrectPassword);
  }

  let new_hash = hasher.hash(&change.new_password)?;
  let updated = store
    .set_password_hash(owner, new_hash)
    .await
    .map_err(Error::store)?;
  if !updated {
    return Err(Error::OwnerNotFound(owner));
  }

  tracing::info!(%owner, "password changed");
  Ok(())
}
