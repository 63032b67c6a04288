//! Client payment confirmation tests
//!
//! Covers signature checking, gateway cross-checks, and the idempotent
//! completion transition. Confirmation never provisions entitlements;
//! that is asserted explicitly here.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use common::*;
use paygate::extractors::Json;
use paygate::handlers::{verify_payment, VerifyRequest};

use async_trait::async_trait;

const ORDER_ID: &str = "order_Verify001";
const PAYMENT_ID: &str = "pay_Verify001";

/// Gateway stub that grabs a pooled connection while the fetch is in
/// flight, the way a concurrent request would. Fails the fetch if the
/// caller is still sitting on the pool's only connection.
struct PoolSharingGateway {
    pool: DbPool,
    payment: GatewayPayment,
}

#[async_trait]
impl PaymentGateway for PoolSharingGateway {
    async fn create_order(
        &self,
        _request: &CreateGatewayOrder,
    ) -> paygate::error::Result<GatewayOrder> {
        Err(AppError::Gateway("not used by this stub".to_string()))
    }

    async fn fetch_payment(&self, _payment_id: &str) -> paygate::error::Result<GatewayPayment> {
        let conn = self
            .pool
            .get_timeout(std::time::Duration::from_secs(1))
            .map_err(|e| AppError::Gateway(format!("pool pinned during fetch: {}", e)))?;
        drop(conn);
        Ok(self.payment.clone())
    }
}

fn verify_request(signature: String) -> VerifyRequest {
    VerifyRequest {
        order_id: ORDER_ID.to_string(),
        payment_id: PAYMENT_ID.to_string(),
        razorpay_signature: signature,
    }
}

#[tokio::test]
async fn test_verify_success() {
    let gateway = Arc::new(MockGateway::with_payment(captured_payment(
        PAYMENT_ID, ORDER_ID, 82_000,
    )));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);
    let response = verify_payment(State(state.clone()), Json(verify_request(sig.clone())))
        .await
        .expect("verification should succeed");

    assert!(response.verified);
    assert!(!response.already_processed);
    assert_eq!(response.payment.id, PAYMENT_ID);

    let conn = state.db.get().unwrap();
    let order = queries::get_order_by_gateway_id(&conn, ORDER_ID)
        .expect("query failed")
        .expect("order should exist");
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_id, Some(PAYMENT_ID.to_string()));
    assert_eq!(order.signature, Some(sig));
    assert!(order.verified_at.is_some());
}

#[tokio::test]
async fn test_verify_releases_db_connection_during_gateway_fetch() {
    // The pool holds a single connection. If verify_payment kept it across
    // the gateway await, other database work (simulated inside the stub's
    // fetch) would block for the whole outbound timeout.
    let pool = test_pool();
    let gateway = Arc::new(PoolSharingGateway {
        pool: pool.clone(),
        payment: captured_payment(PAYMENT_ID, ORDER_ID, 82_000),
    });
    let state = test_state_with_pool(pool, gateway);
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);
    let response = verify_payment(State(state.clone()), Json(verify_request(sig)))
        .await
        .expect("verification should succeed without pinning the pool");

    assert!(response.verified);
    let conn = state.db.get().unwrap();
    let order = queries::get_order_by_gateway_id(&conn, ORDER_ID)
        .expect("query failed")
        .expect("order should exist");
    assert_eq!(order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_verify_repeat_reports_already_processed() {
    let gateway = Arc::new(MockGateway::with_payment(captured_payment(
        PAYMENT_ID, ORDER_ID, 82_000,
    )));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);

    let first = verify_payment(State(state.clone()), Json(verify_request(sig.clone())))
        .await
        .expect("first verification should succeed");
    assert!(!first.already_processed);

    // Retrying the identical confirmation is safe and flagged as a repeat
    let second = verify_payment(State(state.clone()), Json(verify_request(sig)))
        .await
        .expect("repeat verification should succeed");
    assert!(second.verified);
    assert!(second.already_processed, "repeat should report already_processed");
}

#[tokio::test]
async fn test_verify_unknown_order() {
    let gateway = Arc::new(MockGateway::new());
    let state = test_state(Arc::clone(&gateway));

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);
    let result = verify_payment(State(state), Json(verify_request(sig))).await;

    assert!(matches!(result, Err(AppError::OrderNotFound(id)) if id == ORDER_ID));
}

#[tokio::test]
async fn test_verify_invalid_signature() {
    let gateway = Arc::new(MockGateway::with_payment(captured_payment(
        PAYMENT_ID, ORDER_ID, 82_000,
    )));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    // Signature computed under the wrong secret
    let payload = format!("{}|{}", ORDER_ID, PAYMENT_ID);
    let bad_sig = signature::compute_hmac(payload.as_bytes(), "wrong_secret");

    let result = verify_payment(State(state.clone()), Json(verify_request(bad_sig))).await;
    assert!(matches!(result, Err(AppError::InvalidSignature)));

    // Invalid proof must short-circuit before the gateway is consulted
    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 0);

    let conn = state.db.get().unwrap();
    let order = queries::get_order_by_gateway_id(&conn, ORDER_ID)
        .expect("query failed")
        .expect("order should exist");
    assert_eq!(order.status, OrderStatus::Pending, "rejected proof must not transition");
}

#[tokio::test]
async fn test_verify_signature_over_different_pair_rejected() {
    let gateway = Arc::new(MockGateway::with_payment(captured_payment(
        PAYMENT_ID, ORDER_ID, 82_000,
    )));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    // Valid signature, but over a different payment id
    let sig = confirmation_signature(ORDER_ID, "pay_SomeOther");
    let result = verify_payment(State(state), Json(verify_request(sig))).await;

    assert!(matches!(result, Err(AppError::InvalidSignature)));
}

#[tokio::test]
async fn test_verify_amount_mismatch() {
    // Gateway reports 50,000 paise against an order due 82,000
    let gateway = Arc::new(MockGateway::with_payment(captured_payment(
        PAYMENT_ID, ORDER_ID, 50_000,
    )));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);
    let result = verify_payment(State(state.clone()), Json(verify_request(sig))).await;

    assert!(matches!(
        result,
        Err(AppError::AmountMismatch {
            expected: 82_000,
            actual: 50_000
        })
    ));

    let conn = state.db.get().unwrap();
    let order = queries::get_order_by_gateway_id(&conn, ORDER_ID)
        .expect("query failed")
        .expect("order should exist");
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_verify_payment_not_captured() {
    let mut payment = captured_payment(PAYMENT_ID, ORDER_ID, 82_000);
    payment.status = "authorized".to_string();
    let gateway = Arc::new(MockGateway::with_payment(payment));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);
    let result = verify_payment(State(state.clone()), Json(verify_request(sig))).await;

    assert!(matches!(result, Err(AppError::PaymentNotCaptured(status)) if status == "authorized"));

    let conn = state.db.get().unwrap();
    let order = queries::get_order_by_gateway_id(&conn, ORDER_ID)
        .expect("query failed")
        .expect("order should exist");
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_verify_never_provisions_entitlement() {
    let gateway = Arc::new(MockGateway::with_payment(captured_payment(
        PAYMENT_ID, ORDER_ID, 82_000,
    )));
    let state = test_state(Arc::clone(&gateway));
    {
        let conn = state.db.get().unwrap();
        create_test_order(&conn, ORDER_ID, "user_1", 82_000);
    }

    let sig = confirmation_signature(ORDER_ID, PAYMENT_ID);
    verify_payment(State(state.clone()), Json(verify_request(sig)))
        .await
        .expect("verification should succeed");

    // Entitlements come only from the webhook path
    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_user_entitlements(&conn, "user_1").unwrap(), 0);
    let order = queries::get_order_by_gateway_id(&conn, ORDER_ID)
        .expect("query failed")
        .expect("order should exist");
    assert!(order.entitlement_id.is_none());
}
