use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::SignatureError;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Produces a `t=...,v1=...` header value for the payload. Used to sign test fixtures and by tooling that replays
/// events against a local server.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let sig = hex::encode(mac_for(secret, timestamp, payload)?.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={sig}"))
}

/// Verifies a `Stripe-Signature` header against the raw request body.
///
/// The header carries a timestamp and one or more `v1` signatures (more than one during secret rotation). The payload
/// is accepted if any `v1` entry is the hex HMAC-SHA256 of `"{t}.{payload}"` and `t` lies within `tolerance_secs` of
/// `now` (a unix timestamp).
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", t)) => {
                let t = t.parse::<i64>().map_err(|e| SignatureError::MalformedHeader(format!("timestamp: {e}")))?;
                timestamp = Some(t);
            },
            Some(("v1", sig)) => match hex::decode(sig) {
                Ok(bytes) => signatures.push(bytes),
                Err(_) => continue,
            },
            _ => continue,
        }
    }
    let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("no timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader("no v1 signature".to_string()));
    }
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::TimestampOutOfTolerance(tolerance_secs));
    }
    let mac = mac_for(secret, timestamp, payload)?;
    let matched = signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if matched {
        Ok(())
    } else {
        Err(SignatureError::NoMatchingSignature)
    }
}
