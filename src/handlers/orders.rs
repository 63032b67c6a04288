//! Order creation and client-side payment confirmation.
//!
//! The confirmation path (`POST /verify`) validates the client's proof and
//! transitions the order, but deliberately does NOT provision the
//! entitlement - that is the webhook path's job. A client that confirms
//! before the webhook arrives therefore waits on the webhook for its
//! entitlement; see DESIGN.md for the observed asymmetry this preserves.

use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query, UserId};
use crate::gateway::{CreateGatewayOrder, GatewayOrder, GatewayPayment};
use crate::models::CreateOrder;
use crate::pricing::OrderPricing;
use crate::signature;

#[derive(Debug, Deserialize)]
pub struct OrderDetailsQuery {
    #[serde(default)]
    pub discount_percentage: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailsResponse {
    pub name: String,
    #[serde(flatten)]
    pub pricing: OrderPricing,
    /// Public key id the client needs to open checkout
    pub key_id: String,
}

/// A discount percentage is only meaningful in 0..=100; anything else would
/// produce a negative or overflowing breakdown.
fn check_discount(percentage: i64) -> Result<i64> {
    if !(0..=100).contains(&percentage) {
        return Err(AppError::InvalidDiscount(percentage));
    }
    Ok(percentage)
}

/// GET / - current pricing breakdown for the package on sale.
pub async fn get_order_details(
    State(state): State<AppState>,
    Query(query): Query<OrderDetailsQuery>,
) -> Result<Json<OrderDetailsResponse>> {
    let discount = check_discount(query.discount_percentage.unwrap_or(0))?;
    let pricing = OrderPricing::compute(
        state.config.base_amount,
        state.config.tax_percentage,
        discount,
    );

    Ok(Json(OrderDetailsResponse {
        name: state.config.package_name.clone(),
        pricing,
        key_id: state.config.key_id.clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Caller-asserted gateway key id; must match the configured key
    pub key_id: String,
    /// Payable amount in minor units (paise)
    pub amount: i64,
    #[serde(default)]
    pub discount_percentage: Option<i64>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// POST /create - create a remote gateway order and persist the pending
/// local record. No retries on gateway failure; the error propagates.
pub async fn create_order(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<GatewayOrder>> {
    if request.key_id != state.config.key_id {
        return Err(AppError::ConfigMismatch);
    }

    if request.amount <= 0 {
        return Err(AppError::InvalidAmount(request.amount));
    }

    let discount = check_discount(request.discount_percentage.unwrap_or(0))?;

    let gateway_order = state
        .gateway
        .create_order(&CreateGatewayOrder {
            amount: request.amount,
            currency: "INR".to_string(),
            payment_capture: 1,
            notes: serde_json::json!({
                "user_id": user.0,
                "expected_amount": request.amount,
            }),
        })
        .await?;

    let pricing = OrderPricing::compute(
        state.config.base_amount,
        state.config.tax_percentage,
        discount,
    );

    let conn = state.db.get()?;
    let order = queries::create_order(
        &conn,
        &CreateOrder {
            gateway_order_id: gateway_order.id.clone(),
            user_id: user.0.clone(),
            amount_due: request.amount,
            pricing,
            coupon_code: request.coupon_code.clone(),
        },
    )?;

    tracing::info!(
        "Created order {} (gateway {}) for user {}, amount_due {}",
        order.id,
        order.gateway_order_id,
        order.user_id,
        order.amount_due
    );

    Ok(Json(gateway_order))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Gateway order id (`order_...`)
    pub order_id: String,
    /// Gateway payment id (`pay_...`)
    pub payment_id: String,
    /// Client-presented HMAC over `order_id|payment_id`
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    /// True when a previous confirmation (or the webhook) already completed
    /// this order; the call is then a no-op and safe to repeat.
    pub already_processed: bool,
    pub payment: GatewayPayment,
}

/// POST /verify - validate a client-submitted completion claim against the
/// stored order and the gateway's authoritative record, then transition the
/// order idempotently.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    // The pooled connection is released before the gateway call below; a
    // connection held across that await would pin the pool for up to the
    // outbound timeout under concurrent verify load.
    let order = {
        let conn = state.db.get()?;
        queries::get_order_by_gateway_id(&conn, &request.order_id)?
            .ok_or_else(|| AppError::OrderNotFound(request.order_id.clone()))?
    };

    // Proof covers the exact `order_id|payment_id` pair under the key secret.
    let payload = format!("{}|{}", request.order_id, request.payment_id);
    if !signature::verify_hmac(
        payload.as_bytes(),
        &request.razorpay_signature,
        &state.config.key_secret,
    ) {
        return Err(AppError::InvalidSignature);
    }

    let payment = state.gateway.fetch_payment(&request.payment_id).await?;

    if payment.amount != order.amount_due {
        return Err(AppError::AmountMismatch {
            expected: order.amount_due,
            actual: payment.amount,
        });
    }

    if !payment.is_captured() {
        return Err(AppError::PaymentNotCaptured(payment.status.clone()));
    }

    // Single idempotent transition shared with the webhook path. A false
    // result means the order was already completed (or provisioned) - the
    // repeat call mutates nothing, so no re-read is needed after the
    // gateway round trip.
    let conn = state.db.get()?;
    let transitioned = queries::try_complete_order(
        &conn,
        &request.order_id,
        &request.payment_id,
        &request.razorpay_signature,
        Utc::now().timestamp(),
    )?;

    if transitioned {
        tracing::info!(
            "Payment verified for order {} (payment {})",
            request.order_id,
            request.payment_id
        );
    }

    Ok(Json(VerifyResponse {
        verified: true,
        already_processed: !transitioned,
        payment,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CheckCouponRequest {
    pub coupon_code: String,
}

#[derive(Debug, Serialize)]
pub struct CheckCouponResponse {
    pub percentage: i64,
}

/// POST /check-coupon - look up a coupon's discount percentage.
///
/// Absence of a valid coupon, and any store failure, degrade to zero
/// discount rather than failing the request.
pub async fn check_coupon(
    State(state): State<AppState>,
    Json(request): Json<CheckCouponRequest>,
) -> Json<CheckCouponResponse> {
    let percentage = state
        .db
        .get()
        .ok()
        .and_then(|conn| queries::get_coupon(&conn, &request.coupon_code).ok())
        .flatten()
        .map(|coupon| coupon.percentage)
        .unwrap_or(0);

    Json(CheckCouponResponse { percentage })
}
