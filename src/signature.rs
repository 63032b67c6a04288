//! HMAC-SHA256 proof verification for payment confirmations and webhooks.
//!
//! Razorpay signs the client confirmation over `"{order_id}|{payment_id}"`
//! with the key secret, and webhook deliveries over the raw body with the
//! webhook secret. Both are hex-encoded HMAC-SHA256 digests verified here.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn compute_hmac(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a presented hex signature against the HMAC-SHA256 of the exact
/// payload bytes. Side-effect free.
///
/// Uses constant-time comparison to prevent timing attacks. An attacker
/// could otherwise measure response times to progressively discover the
/// correct signature byte-by-byte.
pub fn verify_hmac(payload: &[u8], presented: &str, secret: &str) -> bool {
    let expected = compute_hmac(payload, secret);

    let expected_bytes = expected.as_bytes();
    let presented_bytes = presented.as_bytes();

    // Length check is not constant-time, but that's fine - signature length
    // is not secret (it's always 64 hex chars for SHA-256)
    if expected_bytes.len() != presented_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(presented_bytes).into()
}
