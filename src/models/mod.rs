mod coupon;
mod entitlement;
mod order;

pub use coupon::*;
pub use entitlement::*;
pub use order::*;
