//! Pricing breakdown arithmetic.
//!
//! All amounts are in minor units (paise). The breakdown is computed purely
//! from configuration and the discount percentage; it is embedded in the
//! order record for display and audit only and never consulted during
//! payment verification.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OrderPricing {
    /// Retail price before discount
    pub base_amount: i64,
    pub discount_percentage: i64,
    pub discount_amount: i64,
    pub tax_percentage: i64,
    /// Tax portion of the payable amount
    pub tax_amount: i64,
    /// Payable amount excluding tax
    pub net_amount: i64,
    /// Final payable amount (base - discount), tax inclusive
    pub total_payable: i64,
}

impl OrderPricing {
    /// Compute the breakdown for a given discount percentage.
    ///
    /// Discount and tax both floor toward zero (integer division), matching
    /// the gateway's paise-denominated order amounts. The percentage must
    /// already be validated into 0..=100; the handlers reject anything else.
    pub fn compute(base_amount: i64, tax_percentage: i64, discount_percentage: i64) -> Self {
        let discount_amount = base_amount * discount_percentage / 100;
        let total_payable = base_amount - discount_amount;
        let tax_amount = total_payable * tax_percentage / 100;
        let net_amount = total_payable - tax_amount;

        Self {
            base_amount,
            discount_percentage,
            discount_amount,
            tax_percentage,
            tax_amount,
            net_amount,
            total_payable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_discount() {
        let p = OrderPricing::compute(1_000_000, 18, 0);
        assert_eq!(p.discount_amount, 0);
        assert_eq!(p.total_payable, 1_000_000);
        assert_eq!(p.tax_amount, 180_000);
        assert_eq!(p.net_amount, 820_000);
    }

    #[test]
    fn test_with_discount() {
        let p = OrderPricing::compute(1_000_000, 18, 10);
        assert_eq!(p.discount_amount, 100_000);
        assert_eq!(p.total_payable, 900_000);
        assert_eq!(p.tax_amount, 162_000);
        assert_eq!(p.net_amount, 738_000);
    }

    #[test]
    fn test_full_discount_zeroes_breakdown() {
        let p = OrderPricing::compute(1_000_000, 18, 100);
        assert_eq!(p.discount_amount, 1_000_000);
        assert_eq!(p.total_payable, 0);
        assert_eq!(p.tax_amount, 0);
        assert_eq!(p.net_amount, 0);
    }

    #[test]
    fn test_flooring_never_rounds_up() {
        // 33% of 999 paise = 329.67, must floor to 329
        let p = OrderPricing::compute(999, 18, 33);
        assert_eq!(p.discount_amount, 329);
        assert_eq!(p.total_payable, 670);
        assert_eq!(p.tax_amount, 120); // floor(670 * 0.18) = floor(120.6)
    }
}
