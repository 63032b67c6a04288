use serde::{Deserialize, Serialize};

/// Downstream resource granted to the user upon verified payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub user_id: String,
    pub created_at: i64,
}
