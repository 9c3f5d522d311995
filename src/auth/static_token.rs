// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static bearer-token check.
//!
//! Service-to-service callers present a single configured secret as a
//! bearer token. The secret's presence is a startup precondition (see
//! [`TrustConfig::from_env`]); this module only compares.
//!
//! Both sides are hashed before comparison so the timing of the check is
//! independent of secret length and content.
//!
//! [`TrustConfig::from_env`]: crate::config::TrustConfig::from_env

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time comparison of a presented bearer token against the
/// configured static secret.
pub fn check(presented: &str, configured: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let configured = Sha256::digest(configured.as_bytes());
    bool::from(presented.as_slice().ct_eq(configured.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_passes() {
        assert!(check("svc-secret-1", "svc-secret-1"));
    }

    #[test]
    fn any_other_value_fails() {
        assert!(!check("svc-secret-2", "svc-secret-1"));
        assert!(!check("", "svc-secret-1"));
        assert!(!check("svc-secret-1 ", "svc-secret-1"));
        assert!(!check("svc-secret", "svc-secret-1"));
    }
}
