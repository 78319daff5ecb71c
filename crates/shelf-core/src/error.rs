//! Error types for `shelf-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::validation::FieldErrors;

/// Boxed error from a storage backend or catalog implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Input failed field-level validation; recoverable by resubmitting.
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  /// A requested line names a variant the catalog does not know. The whole
  /// merge is abandoned.
  #[error("variant not found: {0}")]
  VariantNotFound(String),

  #[error("cart not found: {0}")]
  CartNotFound(Uuid),

  /// The address does not exist or belongs to another owner.
  #[error("address not found: {0}")]
  AddressNotFound(Uuid),

  #[error("owner not found: {0}")]
  OwnerNotFound(Uuid),

  /// The owner signs in through an external provider and has no password.
  #[error("owner {0} has no password")]
  NoPassword(Uuid),

  #[error("incorrect current password")]
  IncorrectPassword,

  /// Concurrent read-modify-write cycles on the same cart kept colliding.
  #[error("cart {0} was modified concurrently")]
  CartConflict(Uuid),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("catalog error: {0}")]
  Catalog(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn catalog<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Catalog(Box::new(e))
  }

  /// Whether the error is an infrastructure fault rather than a problem with
  /// the caller's input.
  pub fn is_hard_failure(&self) -> bool {
    matches!(self, Self::Store(_) | Self::Catalog(_) | Self::Hash(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
