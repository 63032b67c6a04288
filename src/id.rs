//! Prefixed ID generation for Paygate entities.
//!
//! All IDs use a `pg_` brand prefix to guarantee collision avoidance with
//! Razorpay's own IDs (`order_`, `pay_`, etc.).
//!
//! Format: `pg_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// Entity types that have prefixed IDs in Paygate.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Order,
    Entitlement,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Order => "pg_ord",
            Self::Entitlement => "pg_ent",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Order.gen_id();
        assert!(id.starts_with("pg_ord_"));
        // pg_ord_ (7 chars) + 32 hex chars = 39 chars total
        assert_eq!(id.len(), 39);
    }

    #[test]
    fn test_ids_are_unique() {
        let id1 = EntityType::Entitlement.gen_id();
        let id2 = EntityType::Entitlement.gen_id();
        assert_ne!(id1, id2);
    }
}
