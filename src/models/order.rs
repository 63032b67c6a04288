use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pricing::OrderPricing;

/// Order status. Monotonic: pending -> completed, completed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Local record of one payment attempt.
///
/// `entitlement_id` is write-once; its presence is the authoritative
/// "already provisioned" flag, independent of `status`. Proof fields
/// (`payment_id`, `signature`) and `verified_at` are populated on the first
/// successful verification and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Razorpay order ID (`order_...`); unique, set at creation
    pub gateway_order_id: String,
    pub user_id: String,
    /// Expected payable amount in minor units (paise)
    pub amount_due: i64,
    pub status: OrderStatus,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub entitlement_id: Option<String>,
    /// Human-readable invoice ID, stamped at provisioning
    pub invoice_id: Option<String>,
    /// Unix seconds of first successful verification
    pub verified_at: Option<i64>,
    pub created_at: i64,

    // Pricing breakdown at creation time - display/audit only, never used
    // for verification.
    pub base_amount: i64,
    pub discount_percentage: i64,
    pub discount_amount: i64,
    pub tax_percentage: i64,
    pub tax_amount: i64,
    pub coupon_code: Option<String>,
}

impl Order {
    /// Whether this order has already been through a successful
    /// verification or provisioning - the idempotency guard both
    /// verification paths consult.
    pub fn already_processed(&self) -> bool {
        self.status == OrderStatus::Completed || self.entitlement_id.is_some()
    }
}

#[derive(Debug)]
pub struct CreateOrder {
    pub gateway_order_id: String,
    pub user_id: String,
    pub amount_due: i64,
    pub pricing: OrderPricing,
    pub coupon_code: Option<String>,
}
