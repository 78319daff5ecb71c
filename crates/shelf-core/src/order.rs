//! Orders and the payment-completion event that creates them.
//!
//! An order is written once and never updated by this crate. Its lines are
//! copies of the cart lines at the moment the payment completed, and its
//! shipping address is a copy of what the payment processor collected; neither
//! refers back to live rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currency recorded when the event does not carry one.
pub const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Paid,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Paid => "paid",
    }
  }
}

/// Shipping details captured by the payment processor. Every field is
/// optional because processors do not always collect an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
  pub name:        Option<String>,
  pub line1:       Option<String>,
  pub line2:       Option<String>,
  pub city:        Option<String>,
  pub state:       Option<String>,
  #[serde(alias = "postalCode")]
  pub postal_code: Option<String>,
  pub country:     Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
  pub product_id:   String,
  pub variant_id:   String,
  /// Product name at purchase time.
  pub name:         String,
  pub variant_name: String,
  /// Unit price actually charged, in minor units.
  pub price:        i64,
  pub quantity:     u32,
  pub image:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:            Uuid,
  pub owner_id:            Option<Uuid>,
  /// Unique per order; the idempotency key for payment events.
  pub payment_session_ref: String,
  pub amount_total:        i64,
  pub currency:            String,
  pub status:              OrderStatus,
  pub shipping:            ShippingSnapshot,
  pub lines:               Vec<OrderLine>,
  pub created_at:          DateTime<Utc>,
}

/// Input to [`crate::store::ShopStore::insert_order`].
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub owner_id:            Option<Uuid>,
  pub payment_session_ref: String,
  pub amount_total:        i64,
  pub currency:            String,
  pub shipping:            ShippingSnapshot,
  pub lines:               Vec<OrderLine>,
}

/// Outcome of [`crate::store::ShopStore::insert_order`].
#[derive(Debug, Clone)]
pub enum OrderInsert {
  Created(Order),
  /// An order with the same payment-session reference already existed;
  /// nothing was written.
  Duplicate(Order),
}

/// A verified "payment completed" notification.
///
/// Signature verification happens before this type is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompletion {
  pub payment_session_ref: String,
  /// Raw cart id from the checkout metadata; may be stale or malformed.
  pub cart_id:             String,
  #[serde(default)]
  pub owner_ref:           Option<Uuid>,
  pub amount_total:        i64,
  #[serde(default)]
  pub currency:            Option<String>,
  #[serde(default)]
  pub shipping:            ShippingSnapshot,
}
