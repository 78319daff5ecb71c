//! JSON HTTP API for the Shelf storefront.
//!
//! Exposes an axum [`Router`] backed by any [`ShopStore`] and [`Catalog`].
//! Authentication and webhook signature checks belong to the layer in front
//! of it; this crate trusts the `x-shelf-owner` header and the event body.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", shelf_api::api_router(state))
//! ```

pub mod account;
pub mod caller;
pub mod cart;
pub mod error;
pub mod orders;
pub mod products;
pub mod webhook;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use shelf_core::{account::PasswordHasher, catalog::Catalog, store::ShopStore};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, C> {
  pub store:   Arc<S>,
  pub catalog: Arc<C>,
  pub hasher:  Arc<dyn PasswordHasher>,
}

// `S` and `C` themselves need not be `Clone`.
impl<S, C> Clone for ApiState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      catalog: Arc::clone(&self.catalog),
      hasher:  Arc::clone(&self.hasher),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: ApiState<S, C>) -> Router<()>
where
  S: ShopStore + 'static,
  C: Catalog + 'static,
{
  Router::new()
    // Cart
    .route("/cart", get(cart::show::<S, C>).put(cart::replace::<S, C>))
    .route("/cart/lines", post(cart::add_line::<S, C>))
    .route(
      "/cart/lines/{variant_id}",
      put(cart::set_quantity::<S, C>).delete(cart::remove_line::<S, C>),
    )
    // Catalog
    .route("/products", get(products::list::<S, C>))
    .route("/products/{slug}", get(products::get_one::<S, C>))
    // Account
    .route("/account/register", post(account::register::<S, C>))
    .route(
      "/account/addresses",
      get(account::list_addresses::<S, C>).post(account::create_address::<S, C>),
    )
    .route("/account/addresses/{id}", delete(account::delete_address::<S, C>))
    .route("/account/addresses/{id}/default", post(account::set_default_address::<S, C>))
    .route("/account/password", post(account::change_password::<S, C>))
    .route("/account/orders", get(orders::list::<S, C>))
    .route("/account/orders/{id}", get(orders::get_one::<S, C>))
    // Payment processor
    .route("/webhooks/payment", post(webhook::payment::<S, C>))
    .with_state(state)
}
