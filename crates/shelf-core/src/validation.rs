//! Field-scoped validation errors.
//!
//! Input forms (addresses, password changes) are checked in full before any
//! write; every failing field collects its own messages so the caller can
//! render them next to the offending input.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Messages keyed by field name. Serialises as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self
      .0
      .entry(field.to_owned())
      .or_default()
      .push(message.into());
  }

  /// Record `message` against `field` when `value` is blank after trimming.
  pub fn require(&mut self, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
      self.add(field, message);
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  /// `Ok(())` when nothing was recorded, otherwise a validation error.
  pub fn into_result(self) -> crate::Result<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(crate::Error::Validation(self))
    }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_values_are_recorded() {
    let mut errors = FieldErrors::new();
    errors.require("city", "   ", "City is required");
    errors.require("zip", "12345", "ZIP code is required");

    assert_eq!(errors.get("city"), Some(&["City is required".to_owned()][..]));
    assert!(errors.get("zip").is_none());
    assert!(errors.into_result().is_err());
  }

  #[test]
  fn display_joins_messages() {
    let mut errors = FieldErrors::new();
    errors.add("b", "second");
    errors.add("a", "first");
    assert_eq!(errors.to_string(), "a: first; b: second");
  }
}
