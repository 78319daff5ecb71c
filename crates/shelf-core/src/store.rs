//! The `ShopStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `shelf-store-sqlite`).
//! Every method that touches more than one row must do so atomically: a
//! reader observes either all of a write or none of it. The engines in this
//! crate rely on that contract for their invariants.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::User,
  address::{Address, AddressFields},
  cart::{Cart, CartReplace, CartWrite},
  order::{NewOrder, Order, OrderInsert},
};

/// Abstraction over the persistent store for carts, addresses, orders and
/// owner accounts.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ShopStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Carts ─────────────────────────────────────────────────────────────

  /// Retrieve a cart with its lines in display order. `None` if not found.
  fn get_cart(
    &self,
    cart_id: Uuid,
  ) -> impl Future<Output = Result<Option<Cart>, Self::Error>> + Send + '_;

  /// Replace the full line set of a cart in one transaction: delete every
  /// existing line, then insert `write.lines`.
  ///
  /// If `write.cart_id` is `None` or does not resolve, a new cart is created
  /// in the same transaction. If `write.expected_revision` is set and the
  /// existing cart's revision differs, nothing is written and
  /// [`CartReplace::Stale`] is returned.
  fn replace_cart_lines(
    &self,
    write: CartWrite,
  ) -> impl Future<Output = Result<CartReplace, Self::Error>> + Send + '_;

  // ── Addresses ─────────────────────────────────────────────────────────

  /// The owner's addresses, newest first.
  fn list_addresses(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Address>, Self::Error>> + Send + '_;

  /// Insert an address. With `make_default`, clear the owner's existing
  /// default before inserting, in the same transaction.
  fn add_address(
    &self,
    owner: Uuid,
    fields: AddressFields,
    make_default: bool,
  ) -> impl Future<Output = Result<Address, Self::Error>> + Send + '_;

  /// Delete by `(address_id, owner)`. Returns `false` if no row matched.
  fn delete_address(
    &self,
    owner: Uuid,
    address_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Clear every default of `owner`, then set `address_id` as default, as one
  /// serialised transaction. Returns `false` (and leaves everything as it
  /// was) if the address does not belong to `owner`.
  fn set_default_address(
    &self,
    owner: Uuid,
    address_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Orders ────────────────────────────────────────────────────────────

  fn get_order(
    &self,
    order_id: Uuid,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  fn get_order_by_payment_session<'a>(
    &'a self,
    payment_session_ref: &'a str,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + 'a;

  /// Insert an order and its lines in one transaction. The payment-session
  /// reference is guarded by a uniqueness constraint; a second insert with
  /// the same reference returns [`OrderInsert::Duplicate`] with the existing
  /// order.
  fn insert_order(
    &self,
    order: NewOrder,
  ) -> impl Future<Output = Result<OrderInsert, Self::Error>> + Send + '_;

  /// The owner's orders, newest first.
  fn list_orders(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + '_;

  // ── Owners ────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    password_hash: Option<String>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Returns `false` if the user does not exist.
  fn set_password_hash(
    &self,
    user_id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
