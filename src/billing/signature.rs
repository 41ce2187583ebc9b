//! Webhook signature verification for the payment processor.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The signed
//! payload is `"{t}.{raw body}"`, HMAC-SHA256 keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::PaymentError;

type HmacSha256 = Hmac<Sha256>;

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(PaymentError::InvalidSignature(
            "Malformed signature header".to_string(),
        )),
    }
}

fn compute(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature("Invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies `header` against the raw request body.
///
/// Fails when the header is malformed, the timestamp is more than
/// `tolerance_secs` away from `now`, or no `v1` signature matches.
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), PaymentError> {
    let parsed = parse_header(header)?;

    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(PaymentError::InvalidSignature(
            "Timestamp outside tolerance window".to_string(),
        ));
    }

    let expected = compute(payload, secret, parsed.timestamp)?;
    let matched = parsed
        .signatures
        .iter()
        .any(|sig| bool::from(expected.as_bytes().ct_eq(sig.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature(
            "No matching signature".to_string(),
        ))
    }
}

/// Produces a signature header for `payload`, as the processor would.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, PaymentError> {
    Ok(format!("t={timestamp},v1={}", compute(payload, secret, timestamp)?))
}
