//! Razorpay webhook endpoint.
//!
//! The gateway delivers events at least once, so everything here is written
//! to tolerate replays: the order claim is a compare-and-swap, and the claim
//! plus provisioning run in one transaction so a partial failure rolls back
//! and the next redelivery retries cleanly.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::provisioning;
use crate::signature;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

const CAPTURED_EVENT: &str = "payment.captured";

/// Gateway webhook envelope. Only the fields the captured-payment path needs
/// are modeled; the rest of the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: Option<WebhookPayload>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<WebhookPaymentWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPaymentWrapper {
    pub entity: WebhookPaymentEntity,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Amount in minor units (paise)
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    /// True when the event was valid but required no work (unhandled event
    /// type, or the order was already provisioned by an earlier delivery).
    pub skipped: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement_id: Option<String>,
}

impl WebhookResponse {
    fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: true,
            message: message.into(),
            entitlement_id: None,
        }
    }

    fn provisioned(entitlement_id: String) -> Self {
        Self {
            success: true,
            skipped: false,
            message: "Entitlement provisioned".to_string(),
            entitlement_id: Some(entitlement_id),
        }
    }
}

/// POST /webhook - authenticate and process a gateway event.
///
/// The signature is verified over the raw request body before any parsing
/// or store access; an unauthenticated request learns nothing about which
/// orders exist.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature header".to_string()))?;

    if !signature::verify_hmac(&body, presented, &state.config.webhook_secret) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(AppError::InvalidSignature);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)?;

    if event.event != CAPTURED_EVENT {
        tracing::debug!("Ignoring webhook event type {}", event.event);
        return Ok(Json(WebhookResponse::skipped(format!(
            "Event {} ignored",
            event.event
        ))));
    }

    let payment = event
        .payload
        .and_then(|p| p.payment)
        .map(|w| w.entity)
        .ok_or_else(|| AppError::BadRequest("Webhook payload missing payment entity".to_string()))?;

    let gateway_order_id = payment
        .order_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Captured payment carries no order id".to_string()))?
        .to_string();

    let mut conn = state.db.get()?;
    let response = process_captured_payment(
        &mut conn,
        &gateway_order_id,
        &payment.id,
        presented,
        payment.amount,
    )
    .map_err(|e| {
        // Re-raise so the gateway sees a failure status and redelivers.
        tracing::error!(
            "Webhook processing failed for order {} (payment {}): {}",
            gateway_order_id,
            payment.id,
            e
        );
        e
    })?;

    Ok(Json(response))
}

/// Claim the order and provision its entitlement inside one transaction.
///
/// If provisioning fails after the claim the whole transaction rolls back,
/// leaving the order pending for the next delivery. Exactly one delivery of
/// any number of concurrent duplicates wins the claim.
fn process_captured_payment(
    conn: &mut Connection,
    gateway_order_id: &str,
    payment_id: &str,
    webhook_signature: &str,
    amount: i64,
) -> Result<WebhookResponse> {
    // Immediate transaction: this path writes, and starting with the write
    // lock avoids the deferred read-to-write upgrade deadlock when two
    // deliveries race. Losers wait on the busy timeout, then observe the
    // committed claim.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let order = queries::get_order_by_gateway_id(&tx, gateway_order_id)?
        .ok_or_else(|| AppError::OrderNotFound(gateway_order_id.to_string()))?;

    if amount != order.amount_due {
        return Err(AppError::AmountMismatch {
            expected: order.amount_due,
            actual: amount,
        });
    }

    if order.already_processed() {
        tracing::info!(
            "Skipping already-processed order {} (duplicate delivery)",
            gateway_order_id
        );
        return Ok(WebhookResponse::skipped("Order already processed"));
    }

    // The webhook has no client confirmation proof; the verified header
    // signature stands in for it. The claim below is what makes replays
    // harmless.
    let claimed = queries::try_complete_order(
        &tx,
        gateway_order_id,
        payment_id,
        webhook_signature,
        Utc::now().timestamp(),
    )?;

    if !claimed {
        // Lost the race to a concurrent delivery between the read above and
        // the update. Equivalent to the already-processed case.
        return Ok(WebhookResponse::skipped("Order already processed"));
    }

    let entitlement_id = provisioning::provision_entitlement(
        &tx,
        &order.user_id,
        gateway_order_id,
        payment_id,
        webhook_signature,
    )?;

    tx.commit()?;

    Ok(WebhookResponse::provisioned(entitlement_id))
}
