// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC payload signatures.
//!
//! Two wire formats are supported:
//!
//! - **Standard**: the payload is a JSON document carrying its signature in a
//!   top-level `signature` field. The field is stripped, the remainder is
//!   canonicalized (all object keys sorted recursively, arrays untouched) and
//!   signed with HMAC-SHA-256, hex-encoded.
//! - **Github**: third-party webhook convention. The signature arrives in a
//!   header as `sha1=<hex>` and covers the request body byte-for-byte as
//!   received; no canonicalization, HMAC-SHA-1.
//!
//! Canonicalization is deterministic: two payloads that differ only in key
//! order produce identical canonical bytes. The sorted-keys rule applies to
//! maps only; sequences keep their original order for wire-compatibility
//! with existing signers.
//!
//! Verification compares digests in constant time and treats malformed
//! payloads or signatures as verification failures, never as panics.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Name of the embedded signature field in standard-mode payloads.
pub const SIGNATURE_FIELD: &str = "signature";

/// Algorithm tag prefixing github-style signatures.
pub const GITHUB_SIGNATURE_PREFIX: &str = "sha1=";

/// Canonicalization/digest mode for payload signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMode {
    /// Sorted-keys canonical JSON, HMAC-SHA-256, bare hex signature.
    Standard,
    /// Raw payload bytes, HMAC-SHA-1, `sha1=`-prefixed signature.
    Github,
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("payload is not valid JSON")]
    MalformedPayload,
}

/// Compute the signature for a payload.
///
/// In standard mode the payload must parse as JSON; its `signature` field
/// (if any) is excluded from the signed content. In github mode the bytes
/// are signed verbatim.
///
/// # Errors
/// Returns [`SignatureError::MalformedPayload`] for unparsable standard-mode
/// payloads.
pub fn sign(payload: &[u8], secret: &[u8], mode: SignatureMode) -> Result<String, SignatureError> {
    match mode {
        SignatureMode::Standard => {
            let value: Value =
                serde_json::from_slice(payload).map_err(|_| SignatureError::MalformedPayload)?;
            let canonical = canonical_payload(&value);
            Ok(hex::encode(hmac_sha256(secret, canonical.as_bytes())))
        }
        SignatureMode::Github => {
            let digest = hmac_sha1(secret, payload);
            Ok(format!("{GITHUB_SIGNATURE_PREFIX}{}", hex::encode(digest)))
        }
    }
}

/// Verify a detached signature over a payload.
///
/// Returns `false` for malformed payloads, malformed signatures, and digest
/// mismatches alike; the comparison itself is constant-time.
pub fn verify(payload: &[u8], signature: &str, secret: &[u8], mode: SignatureMode) -> bool {
    match mode {
        SignatureMode::Standard => {
            let Ok(value) = serde_json::from_slice::<Value>(payload) else {
                return false;
            };
            let canonical = canonical_payload(&value);
            let computed = hmac_sha256(secret, canonical.as_bytes());
            digest_matches(&computed, signature)
        }
        SignatureMode::Github => {
            let Some(hex_part) = signature.strip_prefix(GITHUB_SIGNATURE_PREFIX) else {
                return false;
            };
            let computed = hmac_sha1(secret, payload);
            digest_matches(&computed, hex_part)
        }
    }
}

/// Canonical serialization of a payload: the top-level `signature` field is
/// never part of the signed content.
fn canonical_payload(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|k| k.as_str() != SIGNATURE_FIELD)
                .collect();
            keys.sort_unstable();
            write_object(&keys, map, &mut out);
        }
        other => canonical_json(other, &mut out),
    }
    out
}

/// Recursive canonical JSON writer: object keys sorted, arrays in original
/// order, scalars serialized exactly as serde_json would.
fn canonical_json(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            write_object(&keys, map, out);
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                canonical_json(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_object(keys: &[&String], map: &serde_json::Map<String, Value>, out: &mut String) {
    out.push('{');
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String((*key).clone()).to_string());
        out.push(':');
        canonical_json(&map[key.as_str()], out);
    }
    out.push('}');
}

fn hmac_sha256(secret: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hmac_sha1(secret: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison of a computed digest against a presented hex
/// signature. Length mismatches and non-hex input compare unequal.
fn digest_matches(computed: &[u8], presented_hex: &str) -> bool {
    match hex::decode(presented_hex.trim()) {
        Ok(presented) => computed.ct_eq(&presented).into(),
        Err(_) => false,
    }
}
