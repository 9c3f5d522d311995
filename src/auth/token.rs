// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed bearer tokens.
//!
//! Every issuer in the trust domain signs with its own HS256 key, loaded
//! once at startup from [`TrustConfig`]. Verification enforces, in order:
//! structural well-formedness, signature validity under the expected
//! issuer's key, expiry, audience match, and issuer membership. Any failing
//! step yields a [`TokenError`]; no partial claims escape.
//!
//! Verification is purely in-memory cryptography. There is no per-request
//! call to an external identity provider and no key fetching after startup.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::TrustConfig;

/// Clock skew tolerance (60 seconds).
pub const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Trust-domain issuers. Closed set: accepting tokens from a new issuer is
/// a compile-time change, not a configuration surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Issuer {
    /// The platform identity service; issues end-user tokens.
    AuthService,
    /// This gateway; issues its own verification tokens.
    Gateway,
}

impl Issuer {
    /// Wire value of the `iss` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Issuer::AuthService => "auth_service",
            Issuer::Gateway => "gateway",
        }
    }
}

impl std::fmt::Display for Issuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token verification/issuance failures, one variant per failing step.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not yet valid")]
    NotYetValid,
    #[error("token audience does not match")]
    AudienceMismatch,
    #[error("token issuer is not trusted")]
    UnknownIssuer,
    #[error("token could not be issued")]
    Issue,
}

/// Decoded token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer (one of the trust-domain wire names).
    pub iss: String,
    /// Audience the token was minted for.
    pub aud: String,
    /// Expiration timestamp (Unix seconds).
    pub exp: i64,
    /// Issued-at timestamp (Unix seconds).
    pub iat: i64,
    /// Subject, when the token is bound to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Unique token id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Embedded identity object, copied into the principal on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Value>,
    /// Any further custom claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Claims supplied by the caller at issuance; standard claims (iss, aud,
/// exp, iat, jti) are filled in by the codec.
#[derive(Debug, Clone, Default)]
pub struct ClaimsDraft {
    pub subject: Option<String>,
    pub identity: Option<Value>,
    pub extra: Map<String, Value>,
}

struct IssuerKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl IssuerKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies tokens for the configured trust domain.
pub struct TokenCodec {
    audience: String,
    auth_service: IssuerKeys,
    gateway: IssuerKeys,
}

impl TokenCodec {
    pub fn new(trust: &TrustConfig) -> Self {
        Self {
            audience: trust.audience.clone(),
            auth_service: IssuerKeys::from_secret(&trust.auth_service_key),
            gateway: IssuerKeys::from_secret(&trust.gateway_key),
        }
    }

    /// The audience stamped onto and required of every token.
    pub fn audience(&self) -> &str {
        &self.audience
    }

    fn keys(&self, issuer: Issuer) -> &IssuerKeys {
        match issuer {
            Issuer::AuthService => &self.auth_service,
            Issuer::Gateway => &self.gateway,
        }
    }

    /// Issue a token under the given issuer's key.
    ///
    /// # Errors
    /// Returns [`TokenError::Issue`] if the claims cannot be encoded.
    pub fn issue(
        &self,
        issuer: Issuer,
        draft: ClaimsDraft,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            iss: issuer.as_str().to_string(),
            aud: self.audience.clone(),
            exp: now + ttl.as_secs() as i64,
            iat: now,
            sub: draft.subject,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            identity: draft.identity,
            extra: draft.extra,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys(issuer).encoding)
            .map_err(|_| TokenError::Issue)
    }

    /// Verify a token against the expected issuer's key and the configured
    /// audience, returning the decoded claims.
    ///
    /// # Errors
    /// One [`TokenError`] variant per failing verification step. Fails
    /// closed: a token failing any step yields no claims at all.
    pub fn verify(&self, token: &str, expected_issuer: Issuer) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[expected_issuer.as_str()]);

        let token_data = decode::<TokenClaims>(token, &self.keys(expected_issuer).decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::UnknownIssuer,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                _ => TokenError::Malformed,
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;
    use serde_json::json;

    fn codec() -> TokenCodec {
        TokenCodec::new(&test_config())
    }

    /// Encode claims directly with an issuer key, bypassing `issue`, so
    /// tests can craft expired or mislabeled tokens.
    fn raw_token(claims: &TokenClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn base_claims() -> TokenClaims {
        let now = Utc::now().timestamp();
        TokenClaims {
            iss: "auth_service".to_string(),
            aud: "relational-api".to_string(),
            exp: now + 3600,
            iat: now,
            sub: Some("user_42".to_string()),
            jti: None,
            identity: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let codec = codec();
        let draft = ClaimsDraft {
            subject: Some("user_42".to_string()),
            identity: Some(json!({"email": "u@example.com"})),
            extra: Map::new(),
        };
        let token = codec
            .issue(Issuer::AuthService, draft, Duration::from_secs(3600))
            .unwrap();

        let claims = codec.verify(&token, Issuer::AuthService).unwrap();
        assert_eq!(claims.iss, "auth_service");
        assert_eq!(claims.sub.as_deref(), Some("user_42"));
        assert_eq!(claims.identity, Some(json!({"email": "u@example.com"})));
    }

    #[test]
    fn audience_mismatch_is_rejected() {
        let codec = codec();
        let token = codec
            .issue(Issuer::AuthService, ClaimsDraft::default(), Duration::from_secs(60))
            .unwrap();

        let mut other = test_config();
        other.audience = "some-other-api".to_string();
        let verifier = TokenCodec::new(&other);

        assert_eq!(
            verifier.verify(&token, Issuer::AuthService).unwrap_err(),
            TokenError::AudienceMismatch
        );
    }

    #[test]
    fn expired_token_always_fails() {
        let mut claims = base_claims();
        claims.exp = Utc::now().timestamp() - 7200;
        let token = raw_token(&claims, "auth-service-key");

        assert_eq!(
            codec().verify(&token, Issuer::AuthService).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn unknown_issuer_claim_is_rejected() {
        let mut claims = base_claims();
        claims.iss = "rogue".to_string();
        let token = raw_token(&claims, "auth-service-key");

        assert_eq!(
            codec().verify(&token, Issuer::AuthService).unwrap_err(),
            TokenError::UnknownIssuer
        );
    }

    #[test]
    fn cross_issuer_keys_do_not_validate() {
        let codec = codec();
        let token = codec
            .issue(Issuer::Gateway, ClaimsDraft::default(), Duration::from_secs(60))
            .unwrap();

        // Signed with the gateway key; the auth-service key must reject it.
        assert_eq!(
            codec.verify(&token, Issuer::AuthService).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        assert_eq!(
            codec().verify("not.a.token", Issuer::AuthService).unwrap_err(),
            TokenError::Malformed
        );
    }
}
