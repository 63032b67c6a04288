//! Test utilities and fixtures for Paygate integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

// Re-export the main library crate
pub use paygate::config::Config;
pub use paygate::db::{init_db, queries, AppState, DbPool};
pub use paygate::error::AppError;
pub use paygate::gateway::{CreateGatewayOrder, GatewayOrder, GatewayPayment, PaymentGateway};
pub use paygate::handlers::SIGNATURE_HEADER;
pub use paygate::models::*;
pub use paygate::pricing::OrderPricing;
pub use paygate::signature;

pub const TEST_KEY_ID: &str = "rzp_test_paygate";
pub const TEST_KEY_SECRET: &str = "test_key_secret_xxx";
pub const TEST_WEBHOOK_SECRET: &str = "test_webhook_secret_xxx";

/// Configuration with fixed test credentials and the default catalog
/// (1,000,000 paise base, 18% tax).
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        dev_mode: true,
        key_id: TEST_KEY_ID.to_string(),
        key_secret: TEST_KEY_SECRET.to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        package_name: "Package 1".to_string(),
        base_amount: 1_000_000,
        tax_percentage: 18,
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Gateway stub the handler tests use instead of the real Razorpay client.
/// Returns a canned order handle and payment record, and counts outbound
/// calls so tests can assert the handler never reached the network.
pub struct MockGateway {
    pub order_id: String,
    pub payment: Option<GatewayPayment>,
    pub create_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            order_id: "order_MockGw001".to_string(),
            payment: None,
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_payment(payment: GatewayPayment) -> Self {
        Self {
            payment: Some(payment),
            ..Self::new()
        }
    }
}

/// A captured payment as the gateway would report it.
pub fn captured_payment(payment_id: &str, order_id: &str, amount: i64) -> GatewayPayment {
    GatewayPayment {
        id: payment_id.to_string(),
        order_id: Some(order_id.to_string()),
        amount,
        status: "captured".to_string(),
        currency: Some("INR".to_string()),
        method: Some("upi".to_string()),
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: &CreateGatewayOrder) -> paygate::error::Result<GatewayOrder> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            id: self.order_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            status: Some("created".to_string()),
        })
    }

    async fn fetch_payment(&self, _payment_id: &str) -> paygate::error::Result<GatewayPayment> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.payment
            .clone()
            .ok_or_else(|| AppError::Gateway("No payment configured in mock".to_string()))
    }
}

/// In-memory pool capped at one connection, so every handler call shares
/// the same database (SQLite memory databases are per-connection).
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// File-backed pool for tests that need true concurrent connections.
/// Connections carry a busy timeout so racing write transactions queue.
pub fn test_file_pool(path: &str, max_size: u32) -> DbPool {
    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.busy_timeout(std::time::Duration::from_secs(5)));
    let pool = Pool::builder().max_size(max_size).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// Create an AppState for testing around an existing pool.
pub fn test_state_with_pool(pool: DbPool, gateway: Arc<dyn PaymentGateway>) -> AppState {
    AppState {
        db: pool,
        config: test_config(),
        gateway,
    }
}

/// Create an AppState for testing with an in-memory database.
pub fn test_state(gateway: Arc<MockGateway>) -> AppState {
    test_state_with_pool(test_pool(), gateway)
}

/// Insert a pending order with the default pricing breakdown.
pub fn create_test_order(
    conn: &Connection,
    gateway_order_id: &str,
    user_id: &str,
    amount_due: i64,
) -> Order {
    queries::create_order(
        conn,
        &CreateOrder {
            gateway_order_id: gateway_order_id.to_string(),
            user_id: user_id.to_string(),
            amount_due,
            pricing: OrderPricing::compute(1_000_000, 18, 0),
            coupon_code: None,
        },
    )
    .expect("Failed to create test order")
}

/// Client-side confirmation proof over `order_id|payment_id`.
pub fn confirmation_signature(order_id: &str, payment_id: &str) -> String {
    let payload = format!("{}|{}", order_id, payment_id);
    signature::compute_hmac(payload.as_bytes(), TEST_KEY_SECRET)
}

/// Raw body of a `payment.captured` webhook delivery.
pub fn captured_event_body(order_id: &str, payment_id: &str, amount: i64) -> Vec<u8> {
    serde_json::json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": amount,
                    "currency": "INR",
                    "status": "captured",
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

/// Headers carrying a valid webhook signature for `body`.
pub fn signed_webhook_headers(body: &[u8]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let sig = signature::compute_hmac(body, TEST_WEBHOOK_SECRET);
    headers.insert(SIGNATURE_HEADER, sig.parse().unwrap());
    headers
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
