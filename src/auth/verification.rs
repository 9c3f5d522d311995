// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Action-scoped verification tokens.
//!
//! Short-lived tokens minted by the gateway itself to authorize exactly one
//! sensitive action (password reset, account deletion, ...), optionally
//! bound to a one-time code and/or a subject. The OTP is never
//! self-validating: the token carries the value bound at issuance, and the
//! caller must supply a matching code out-of-band at verification time.
//!
//! There is no revocation list; the minutes-scale TTL is the sole
//! invalidation path.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

use super::token::{ClaimsDraft, Issuer, TokenCodec, TokenError};

/// Claim carrying the single action a token is good for.
pub const ACTION_CLAIM: &str = "action";

/// Claim carrying the bound one-time code.
pub const OTP_CLAIM: &str = "otp";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("verification token is missing")]
    TokenMissing,
    #[error("one-time code is missing")]
    OtpMissing,
    #[error("one-time code does not match")]
    OtpMismatch,
    #[error("token carries no one-time code binding")]
    OtpNotBound,
    #[error("token was issued for a different action")]
    ActionMismatch,
    #[error("token subject does not match")]
    SubjectMismatch,
    #[error("token carries no subject")]
    SubjectRequired,
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Issuance parameters beyond action and subject.
#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    /// One-time code to bind; verification will demand it back.
    pub otp: Option<String>,
    /// Token lifetime; defaults to the configured verification TTL.
    pub ttl: Option<Duration>,
}

/// Verification parameters resolved by the caller (middleware) per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions<'a> {
    /// Action the consuming endpoint is configured for.
    pub action: &'a str,
    /// Caller-supplied one-time code, if any.
    pub otp: Option<&'a str>,
    /// Whether the endpoint demands an OTP binding regardless of the token.
    pub require_otp: bool,
    /// Subject resolved from request context, if any.
    pub subject: Option<&'a str>,
    /// Whether the token must carry a subject.
    pub require_subject: bool,
    /// Expected issuer; defaults to the gateway's own trust domain.
    pub issuer: Option<Issuer>,
}

/// Verified token contents handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPayload {
    pub action: String,
    pub subject: Option<String>,
    pub otp_verified: bool,
}

/// Issues and verifies single-purpose verification tokens.
pub struct VerificationCodec {
    tokens: Arc<TokenCodec>,
    default_ttl: Duration,
}

impl VerificationCodec {
    pub fn new(tokens: Arc<TokenCodec>, default_ttl: Duration) -> Self {
        Self { tokens, default_ttl }
    }

    /// Issue a token for one action, optionally bound to a subject and OTP.
    ///
    /// # Errors
    /// Returns a [`TokenError`] if the underlying token cannot be encoded.
    pub fn issue(
        &self,
        action: &str,
        subject: Option<&str>,
        options: IssueOptions,
    ) -> Result<String, TokenError> {
        let mut extra = Map::new();
        extra.insert(ACTION_CLAIM.to_string(), Value::String(action.to_string()));
        if let Some(otp) = options.otp {
            extra.insert(OTP_CLAIM.to_string(), Value::String(otp));
        }

        let draft = ClaimsDraft {
            subject: subject.map(str::to_string),
            identity: None,
            extra,
        };
        self.tokens
            .issue(Issuer::Gateway, draft, options.ttl.unwrap_or(self.default_ttl))
    }

    /// Verify a token against the consuming endpoint's configuration.
    ///
    /// # Errors
    /// Signature/expiry/audience failures surface as
    /// [`VerificationError::Token`]; action, OTP and subject bindings have
    /// their own variants so missing and mismatching credentials stay
    /// distinguishable.
    pub fn verify(
        &self,
        token: &str,
        options: VerifyOptions<'_>,
    ) -> Result<VerificationPayload, VerificationError> {
        let claims = self
            .tokens
            .verify(token, options.issuer.unwrap_or(Issuer::Gateway))?;

        // Tokens are single-purpose: good for exactly one action.
        let action = claims
            .extra
            .get(ACTION_CLAIM)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if action != options.action {
            return Err(VerificationError::ActionMismatch);
        }

        let bound_otp = claims.extra.get(OTP_CLAIM).and_then(Value::as_str);
        let otp_verified = match bound_otp {
            Some(bound) => {
                let supplied = options
                    .otp
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or(VerificationError::OtpMissing)?;
                if !bool::from(supplied.as_bytes().ct_eq(bound.as_bytes())) {
                    return Err(VerificationError::OtpMismatch);
                }
                true
            }
            None if options.require_otp => return Err(VerificationError::OtpNotBound),
            None => false,
        };

        match (claims.sub.as_deref(), options.subject) {
            (Some(bound), Some(resolved)) if bound != resolved => {
                return Err(VerificationError::SubjectMismatch);
            }
            (None, _) if options.require_subject => {
                return Err(VerificationError::SubjectRequired);
            }
            _ => {}
        }

        Ok(VerificationPayload {
            action: action.to_string(),
            subject: claims.sub,
            otp_verified,
        })
    }
}
