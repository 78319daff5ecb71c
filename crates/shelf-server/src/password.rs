//! argon2 implementation of [`shelf_core::account::PasswordHasher`].

use argon2::{
  Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;
use shelf_core::{Error, Result, account::PasswordHasher};

/// Produces and checks PHC strings, e.g. `$argon2id$v=19$…`.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
  argon2: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
  fn hash(&self, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Hash(e.to_string()))
  }

  fn verify(&self, password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::Hash(e.to_string()))?;
    match self.argon2.verify_password(password.as_bytes(), &parsed) {
      Ok(()) => Ok(true),
      Err(argon2::password_hash::Error::Password) => Ok(false),
      Err(e) => Err(Error::Hash(e.to_string())),
    }
  }
}
