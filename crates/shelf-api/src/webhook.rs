//! `POST /webhooks/payment`: payment-completion events.
//!
//! The body is a signature-verified event forwarded by the payment
//! integration. Any outcome that should not be retried answers `200`:
//! created, already processed, or skipped. An event is skipped when the cart
//! is gone or empty, or when `paymentSessionRef` is blank. Only store faults
//! answer `500`, which tells the processor to redeliver.

use axum::{Json, extract::State};
use serde::Serialize;
use shelf_core::{
  catalog::Catalog,
  materialize::{Materialized, SkipReason, materialize_order},
  order::PaymentCompletion,
  store::ShopStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Created,
  Existing,
  Skipped,
}

#[derive(Debug, Serialize)]
pub struct Receipt {
  pub received: bool,
  pub outcome:  Outcome,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub order_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:   Option<SkipReason>,
}

/// `POST /webhooks/payment`
pub async fn payment<S, C>(
  State(state): State<ApiState<S, C>>,
  Json(event): Json<PaymentCompletion>,
) -> Result<Json<Receipt>, ApiError>
where
  S: ShopStore,
  C: Catalog,
{
  let session = event.payment_session_ref.clone();
  let outcome = materialize_order(&*state.store, event).await.map_err(|e| {
    if e.is_hard_failure() {
      tracing::error!(%session, error = %e, "payment event failed, requesting redelivery");
    }
    ApiError::from(e)
  })?;

  let receipt = match outcome {
    Materialized::Created(order) => Receipt {
      received: true,
      outcome:  Outcome::Created,
      order_id: Some(order.order_id),
      reason:   None,
    },
    Materialized::Existing(order) => Receipt {
      received: true,
      outcome:  Outcome::Existing,
      order_id: Some(order.order_id),
      reason:   None,
    },
    Materialized::Skipped(reason) => Receipt {
      received: true,
      outcome:  Outcome::Skipped,
      order_id: None,
      reason:   Some(reason),
    },
  };
  Ok(Json(receipt))
}
