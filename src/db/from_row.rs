//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

// ============ SQL SELECT Constants ============

pub const ORDER_COLS: &str = "id, gateway_order_id, user_id, amount_due, status, payment_id, signature, entitlement_id, invoice_id, verified_at, created_at, base_amount, discount_percentage, discount_amount, tax_percentage, tax_amount, coupon_code";

pub const ENTITLEMENT_COLS: &str = "id, user_id, created_at";

pub const COUPON_COLS: &str = "coupon_code, percentage, valid";

// ============ FromRow Implementations ============

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            gateway_order_id: row.get(1)?,
            user_id: row.get(2)?,
            amount_due: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            payment_id: row.get(5)?,
            signature: row.get(6)?,
            entitlement_id: row.get(7)?,
            invoice_id: row.get(8)?,
            verified_at: row.get(9)?,
            created_at: row.get(10)?,
            base_amount: row.get(11)?,
            discount_percentage: row.get(12)?,
            discount_amount: row.get(13)?,
            tax_percentage: row.get(14)?,
            tax_amount: row.get(15)?,
            coupon_code: row.get(16)?,
        })
    }
}

impl FromRow for Entitlement {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Entitlement {
            id: row.get(0)?,
            user_id: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl FromRow for Coupon {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Coupon {
            coupon_code: row.get(0)?,
            percentage: row.get(1)?,
            valid: row.get(2)?,
        })
    }
}
