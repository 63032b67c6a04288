//! Entitlement provisioning: create the purchased resource and stamp it
//! onto the order record.
//!
//! This operation is not idempotent on its own - callers must hold the
//! order's verification claim (see `queries::try_complete_order`) before
//! invoking it, and should run it inside the same database transaction so a
//! provisioning failure rolls the claim back for gateway redelivery.

use chrono::{FixedOffset, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};

/// The gateway settles on the Indian calendar day; invoice dates use a fixed
/// +05:30 offset rather than a full timezone lookup.
const INVOICE_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Derive the human-readable invoice identifier for an entitlement:
/// `INV-YYYYMMDD-<entitlement id>`, dated at the gateway-local calendar day.
pub fn invoice_id_for(entitlement_id: &str) -> String {
    let offset = FixedOffset::east_opt(INVOICE_UTC_OFFSET_SECS)
        .expect("offset is within bounds");
    let local_day = Utc::now().with_timezone(&offset);
    format!("INV-{}-{}", local_day.format("%Y%m%d"), entitlement_id)
}

/// Create an entitlement for `user_id` and stamp it onto the order,
/// returning the new entitlement ID.
///
/// Fails with `OrderNotFound` if the order record vanished between the
/// caller's claim and this step - that is treated as fatal rather than
/// leaving a silently orphaned entitlement.
pub fn provision_entitlement(
    conn: &Connection,
    user_id: &str,
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<String> {
    let entitlement = queries::create_entitlement(conn, user_id)?;
    let invoice_id = invoice_id_for(&entitlement.id);

    let assigned = queries::try_assign_entitlement(
        conn,
        gateway_order_id,
        &entitlement.id,
        &invoice_id,
        payment_id,
        signature,
        Utc::now().timestamp(),
    )?;

    if !assigned {
        // Zero rows matched: either the order is gone, or another caller
        // provisioned despite the claim. Both are fatal here.
        return match queries::get_order_by_gateway_id(conn, gateway_order_id)? {
            None => Err(AppError::OrderNotFound(gateway_order_id.to_string())),
            Some(order) => Err(AppError::Internal(format!(
                "Order {} already has entitlement {:?}",
                gateway_order_id, order.entitlement_id
            ))),
        };
    }

    tracing::info!(
        "Provisioned entitlement {} (invoice {}) for order {}",
        entitlement.id,
        invoice_id,
        gateway_order_id
    );

    Ok(entitlement.id)
}
