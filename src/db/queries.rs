use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{query_one, COUPON_COLS, ENTITLEMENT_COLS, ORDER_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Orders ============

/// Insert a new pending order record.
pub fn create_order(conn: &Connection, input: &CreateOrder) -> Result<Order> {
    let id = EntityType::Order.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO orders (id, gateway_order_id, user_id, amount_due, status, created_at,
                             base_amount, discount_percentage, discount_amount,
                             tax_percentage, tax_amount, coupon_code)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            &input.gateway_order_id,
            &input.user_id,
            input.amount_due,
            now,
            input.pricing.base_amount,
            input.pricing.discount_percentage,
            input.pricing.discount_amount,
            input.pricing.tax_percentage,
            input.pricing.tax_amount,
            &input.coupon_code,
        ],
    )?;

    Ok(Order {
        id,
        gateway_order_id: input.gateway_order_id.clone(),
        user_id: input.user_id.clone(),
        amount_due: input.amount_due,
        status: OrderStatus::Pending,
        payment_id: None,
        signature: None,
        entitlement_id: None,
        invoice_id: None,
        verified_at: None,
        created_at: now,
        base_amount: input.pricing.base_amount,
        discount_percentage: input.pricing.discount_percentage,
        discount_amount: input.pricing.discount_amount,
        tax_percentage: input.pricing.tax_percentage,
        tax_amount: input.pricing.tax_amount,
        coupon_code: input.coupon_code.clone(),
    })
}

pub fn get_order_by_gateway_id(conn: &Connection, gateway_order_id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE gateway_order_id = ?1",
            ORDER_COLS
        ),
        &[&gateway_order_id],
    )
}

/// Atomically transition an order pending -> completed, populating the proof
/// fields. This is the single transition function both verification paths
/// (client confirmation and webhook) route through.
///
/// Uses compare-and-swap: the update only matches while the order is still
/// pending and unprovisioned, so of any number of concurrent verification
/// attempts exactly one observes `true`.
///
/// Returns:
/// - `Ok(true)` if this call performed the transition
/// - `Ok(false)` if the order was already completed/provisioned (or absent)
pub fn try_complete_order(
    conn: &Connection,
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
    verified_at: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders
         SET status = 'completed', payment_id = ?2, signature = ?3, verified_at = ?4
         WHERE gateway_order_id = ?1 AND status = 'pending' AND entitlement_id IS NULL",
        params![gateway_order_id, payment_id, signature, verified_at],
    )?;
    Ok(affected > 0)
}

/// Atomically stamp a provisioned entitlement onto an order.
///
/// The `entitlement_id IS NULL` predicate makes the write-once guarantee
/// hold even if two provisioners race: the loser's update matches zero rows.
/// Proof fields are only filled where still unset so a prior confirmation's
/// values survive.
pub fn try_assign_entitlement(
    conn: &Connection,
    gateway_order_id: &str,
    entitlement_id: &str,
    invoice_id: &str,
    payment_id: &str,
    signature: &str,
    verified_at: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders
         SET status = 'completed',
             entitlement_id = ?2,
             invoice_id = ?3,
             payment_id = COALESCE(payment_id, ?4),
             signature = COALESCE(signature, ?5),
             verified_at = COALESCE(verified_at, ?6)
         WHERE gateway_order_id = ?1 AND entitlement_id IS NULL",
        params![
            gateway_order_id,
            entitlement_id,
            invoice_id,
            payment_id,
            signature,
            verified_at
        ],
    )?;
    Ok(affected > 0)
}

// ============ Entitlements ============

/// Create an entitlement record for a user, returning the new row.
pub fn create_entitlement(conn: &Connection, user_id: &str) -> Result<Entitlement> {
    let id = EntityType::Entitlement.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO entitlements (id, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![&id, user_id, now],
    )?;

    Ok(Entitlement {
        id,
        user_id: user_id.to_string(),
        created_at: now,
    })
}

pub fn get_entitlement(conn: &Connection, id: &str) -> Result<Option<Entitlement>> {
    query_one(
        conn,
        &format!("SELECT {} FROM entitlements WHERE id = ?1", ENTITLEMENT_COLS),
        &[&id],
    )
}

/// Count entitlements held by a user (duplicate-provisioning checks in tests
/// and the webhook idempotency property).
pub fn count_user_entitlements(conn: &Connection, user_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM entitlements WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Coupons ============

/// Look up a valid coupon's discount percentage.
pub fn get_coupon(conn: &Connection, coupon_code: &str) -> Result<Option<Coupon>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM coupons WHERE coupon_code = ?1 AND valid = 1",
            COUPON_COLS
        ),
        &[&coupon_code],
    )
}

/// Insert or replace a coupon (dev seeding and tests).
pub fn upsert_coupon(conn: &Connection, coupon_code: &str, percentage: i64, valid: bool) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO coupons (coupon_code, percentage, valid) VALUES (?1, ?2, ?3)",
        params![coupon_code, percentage, valid],
    )?;
    Ok(())
}
