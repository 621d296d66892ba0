//! Stateless proof-of-password token.
//!
//! Format: `expiry.nonce.signature` where `expiry` is a unix-millisecond
//! timestamp, `nonce` is 16 random bytes hex-encoded, and `signature` is
//! hex(HMAC-SHA256(secret, "expiry.nonce")). The token contents are not
//! secret; the only contract is unforgeability.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Issue a gate token valid for `window_seconds` from now.
pub fn issue_gate_token(
    secret: &Secret<String>,
    window_seconds: u64,
) -> Result<String, anyhow::Error> {
    let expiry = Utc::now().timestamp_millis() + (window_seconds as i64) * 1000;

    let mut nonce_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = hex::encode(nonce_bytes);

    let signature = sign(secret, expiry, &nonce)?;
    Ok(format!("{}.{}.{}", expiry, nonce, signature))
}

/// Verify a gate token. Fails closed: any malformed, expired or mis-signed
/// token is simply invalid, never an error surfaced to the caller.
pub fn verify_gate_token(token: &str, secret: &Secret<String>) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return false;
    }

    let expiry: i64 = match parts[0].parse() {
        Ok(v) if v > 0 => v,
        _ => return false,
    };

    // No clock-skew tolerance: expiry at or before now is invalid.
    if expiry <= Utc::now().timestamp_millis() {
        return false;
    }

    let expected = match sign(secret, expiry, parts[1]) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    // Length mismatch is an immediate failure; equal lengths are compared in
    // constant time.
    let expected_bytes = expected.as_bytes();
    let provided_bytes = parts[2].as_bytes();
    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}

fn sign(secret: &Secret<String>, expiry: i64, nonce: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;
    mac.update(format!("{}.{}", expiry, nonce).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
