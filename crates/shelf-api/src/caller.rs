//! Request identity: the caller's owner id and the cart cookie.
//!
//! Authentication happens upstream. The auth layer forwards the signed-in
//! owner as a UUID in the `x-shelf-owner` header and strips any value the
//! client tried to send itself.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated owner id.
pub const OWNER_HEADER: &str = "x-shelf-owner";

/// Cookie carrying the cart id between requests.
pub const CART_COOKIE: &str = "cart_id";

const CART_COOKIE_DAYS: i64 = 30;

// ─── Caller ──────────────────────────────────────────────────────────────────

/// Who is making the request. Guests may shop but not manage an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
  Owner(Uuid),
  Guest,
}

impl Caller {
  pub fn owner_id(self) -> Option<Uuid> {
    match self {
      Caller::Owner(id) => Some(id),
      Caller::Guest => None,
    }
  }
}

fn caller_from(headers: &HeaderMap) -> Result<Caller, ApiError> {
  let Some(value) = headers.get(OWNER_HEADER) else {
    return Ok(Caller::Guest);
  };
  value
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .map(Caller::Owner)
    .ok_or_else(|| ApiError::BadRequest(format!("malformed {OWNER_HEADER} header")))
}

impl<St: Send + Sync> FromRequestParts<St> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    caller_from(&parts.headers)
  }
}

/// Extractor for routes that require a signed-in owner.
#[derive(Debug, Clone, Copy)]
pub struct Owner(pub Uuid);

impl<St: Send + Sync> FromRequestParts<St> for Owner {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    match caller_from(&parts.headers)? {
      Caller::Owner(id) => Ok(Owner(id)),
      Caller::Guest => Err(ApiError::Unauthorized),
    }
  }
}

// ─── Cart cookie ─────────────────────────────────────────────────────────────

/// The cart id from the request's cookies. A malformed value is treated as
/// no cart at all.
pub fn cart_id_from(jar: &CookieJar) -> Option<Uuid> {
  jar
    .get(CART_COOKIE)
    .and_then(|c| Uuid::parse_str(c.value().trim()).ok())
}

pub fn cart_cookie(cart_id: Uuid) -> Cookie<'static> {
  Cookie::build((CART_COOKIE, cart_id.to_string()))
    .http_only(true)
    .same_site(SameSite::Lax)
    .path("/")
    .max_age(Duration::days(CART_COOKIE_DAYS))
    .build()
}

/// Add the `cart_id` cookie to the jar unless the client already sent it.
/// The jar only emits `Set-Cookie` for cookies added here.
pub fn remember_cart(jar: CookieJar, inbound: Option<Uuid>, cart_id: Uuid) -> CookieJar {
  if inbound == Some(cart_id) {
    jar
  } else {
    jar.add(cart_cookie(cart_id))
  }
}
