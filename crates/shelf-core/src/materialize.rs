//! Turning a payment-completion event into exactly one order.
//!
//! Payment processors deliver events at least once. Idempotency rests on the
//! store's uniqueness constraint over the payment-session reference; the
//! lookup at the start is a shortcut for the common redelivery case, not the
//! guarantee.
//!
//! Outcomes, and what the boundary should answer upstream:
//!
//! | Outcome | Meaning | Upstream |
//! |---------|---------|----------|
//! | [`Materialized::Created`] | new order written | acknowledge |
//! | [`Materialized::Existing`] | already processed | acknowledge |
//! | [`Materialized::Skipped`] | no session reference, cart missing or empty; nothing written | acknowledge |
//! | `Err(_)` with [`Error::is_hard_failure`] | store fault | ask for retry |

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  cart::Cart,
  order::{DEFAULT_CURRENCY, NewOrder, Order, OrderInsert, OrderLine, PaymentCompletion},
  store::ShopStore,
};

#[derive(Debug, Clone)]
pub enum Materialized {
  Created(Order),
  /// An order for this payment session already existed; returned unchanged.
  Existing(Order),
  Skipped(SkipReason),
}

impl Materialized {
  pub fn order(&self) -> Option<&Order> {
    match self {
      Self::Created(o) | Self::Existing(o) => Some(o),
      Self::Skipped(_) => None,
    }
  }
}

/// Why an event was acknowledged without creating an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// Blank `paymentSessionRef`; without it there is no idempotency key.
  MissingSessionRef,
  CartNotFound,
  CartEmpty,
}

/// Materialise the order for a verified payment event.
pub async fn materialize_order<S: ShopStore>(
  store: &S,
  event: PaymentCompletion,
) -> Result<Materialized> {
  if event.payment_session_ref.trim().is_empty() {
    tracing::warn!(cart_id = %event.cart_id, "payment event without session reference, skipping");
    return Ok(Materialized::Skipped(SkipReason::MissingSessionRef));
  }

  if let Some(existing) = store
    .get_order_by_payment_session(&event.payment_session_ref)
    .await
    .map_err(Error::store)?
  {
    tracing::info!(
      session = %event.payment_session_ref,
      order_id = %existing.order_id,
      "payment already materialised"
    );
    return Ok(Materialized::Existing(existing));
  }

  let cart = match Uuid::parse_str(event.cart_id.trim()) {
    Ok(id) => store.get_cart(id).await.map_err(Error::store)?,
    Err(_) => None,
  };
  let Some(cart) = cart else {
    tracing::warn!(session = %event.payment_session_ref, cart_id = %event.cart_id, "cart not found");
    return Ok(Materialized::Skipped(SkipReason::CartNotFound));
  };
  if cart.lines.is_empty() {
    tracing::warn!(session = %event.payment_session_ref, cart_id = %cart.cart_id, "cart is empty");
    return Ok(Materialized::Skipped(SkipReason::CartEmpty));
  }

  let order = new_order(event, &cart);
  match store.insert_order(order).await.map_err(Error::store)? {
    OrderInsert::Created(order) => {
      tracing::info!(
        session = %order.payment_session_ref,
        order_id = %order.order_id,
        lines = order.lines.len(),
        "order created"
      );
      Ok(Materialized::Created(order))
    }
    OrderInsert::Duplicate(order) => {
      tracing::info!(
        session = %order.payment_session_ref,
        order_id = %order.order_id,
        "concurrent delivery already created the order"
      );
      Ok(Materialized::Existing(order))
    }
  }
}

/// Build the order from the event and the cart snapshot as stored. Prices
/// come from the cart lines, never from the catalog; the total comes from the
/// event.
fn new_order(event: PaymentCompletion, cart: &Cart) -> NewOrder {
  let currency = event
    .currency
    .filter(|c| !c.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());

  NewOrder {
    owner_id: event.owner_ref,
    payment_session_ref: event.payment_session_ref,
    amount_total: event.amount_total,
    currency,
    shipping: event.shipping,
    lines: cart
      .lines
      .iter()
      .map(|line| OrderLine {
        product_id:   line.variant.product.product_id.clone(),
        variant_id:   line.variant.variant_id.clone(),
        name:         line.variant.product.name.clone(),
        variant_name: line.variant.name.clone(),
        price:        line.variant.price,
        quantity:     line.quantity,
        image:        line.variant.image.clone(),
      })
      .collect(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::cart::{CartLine, ProductSnapshot, VariantSnapshot};

  fn event() -> PaymentCompletion {
    PaymentCompletion {
      payment_session_ref: "sess_1".into(),
      cart_id:             Uuid::new_v4().to_string(),
      owner_ref:           None,
      amount_total:        4321,
      currency:            Some(" ".into()),
      shipping:            Default::default(),
    }
  }

  #[test]
  fn order_copies_cart_snapshot_and_event_total() {
    let now = Utc::now();
    let cart = Cart {
      cart_id:    Uuid::new_v4(),
      owner_id:   None,
      revision:   1,
      lines:      vec![CartLine {
        line_id:  Uuid::new_v4(),
        quantity: 3,
        variant:  VariantSnapshot {
          variant_id: "var_6".into(),
          name:       "Standard".into(),
          price:      1500,
          image:      Some("mug.jpg".into()),
          product:    ProductSnapshot {
            product_id: "prod_2".into(),
            slug:       "ceramic-mug".into(),
            name:       "Ceramic Mug".into(),
          },
        },
      }],
      created_at: now,
      updated_at: now,
    };

    let order = new_order(event(), &cart);
    assert_eq!(order.amount_total, 4321);
    assert_eq!(order.currency, DEFAULT_CURRENCY);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].product_id, "prod_2");
    assert_eq!(order.lines[0].price, 1500);
    assert_eq!(order.lines[0].quantity, 3);
  }

  #[test]
  fn event_deserialises_from_camel_case() {
    let event: PaymentCompletion = serde_json::from_value(serde_json::json!({
      "paymentSessionRef": "sess_9",
      "cartId": "not-a-uuid",
      "amountTotal": 100,
      "shipping": { "name": "Ada", "city": "London" }
    }))
    .unwrap();
    assert_eq!(event.payment_session_ref, "sess_9");
    assert_eq!(event.shipping.city.as_deref(), Some("London"));
    assert!(event.currency.is_none());
  }
}
