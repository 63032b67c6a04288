use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub coupon_code: String,
    pub percentage: i64,
    pub valid: bool,
}
