// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication strategies.
//!
//! Every endpoint declares exactly one [`AuthStrategy`] at registration.
//! The set is closed: the dispatcher matches exhaustively, so adding a
//! strategy is a compile-time-checked change across the whole pipeline.

use super::extract::Lookup;

/// Default header carrying a verification token.
pub const VERIFICATION_TOKEN_HEADER: &str = "x-verification-token";

/// Default body/query field carrying a verification token.
pub const VERIFICATION_TOKEN_FIELD: &str = "verificationToken";

/// Default header carrying the one-time code.
pub const VERIFICATION_OTP_HEADER: &str = "x-verification-otp";

/// Default body/query field carrying the one-time code.
pub const VERIFICATION_OTP_FIELD: &str = "verificationOtp";

/// Header carrying github-style HMAC signatures.
pub const GITHUB_SIGNATURE_HEADER: &str = "x-hub-signature";

/// Per-endpoint authentication strategy.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// No authentication; handler runs for anyone.
    None,
    /// Static service secret as bearer token.
    Static,
    /// Identity token from the platform auth service.
    Jwt,
    /// HMAC-signed payload.
    Hmac(HmacParams),
    /// Transport-verified client certificate.
    Tls,
    /// Single-action verification token.
    Verification(VerificationParams),
}

impl AuthStrategy {
    /// Strategy name for the failure-reporting sink.
    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::None => "none",
            AuthStrategy::Static => "static",
            AuthStrategy::Jwt => "jwt",
            AuthStrategy::Hmac(_) => "hmac",
            AuthStrategy::Tls => "tls",
            AuthStrategy::Verification(_) => "verification",
        }
    }
}

/// HMAC strategy parameters.
#[derive(Debug, Clone, Default)]
pub struct HmacParams {
    /// Per-endpoint secret; falls back to the shared HMAC secret.
    pub secret: Option<String>,
    /// Github-compatible mode: signature in [`GITHUB_SIGNATURE_HEADER`]
    /// over the raw body, instead of an embedded `signature` field over the
    /// canonicalized body.
    pub github: bool,
}

/// Verification strategy parameters.
///
/// Token and OTP locations are looked up header-first, then body field,
/// then query field; each name can be overridden per endpoint.
#[derive(Debug, Clone)]
pub struct VerificationParams {
    /// The one action tokens must be bound to.
    pub action: String,
    /// Demand an OTP binding even if a token without one shows up.
    pub require_otp: bool,
    /// Header carrying the token.
    pub token_header: String,
    /// Body/query field carrying the token.
    pub token_field: String,
    /// Header carrying the OTP.
    pub otp_header: String,
    /// Body/query field carrying the OTP.
    pub otp_field: String,
    /// Where to resolve the expected subject from, if anywhere.
    pub subject: Option<Lookup>,
    /// Demand that the token itself carries a subject.
    pub require_subject: bool,
}

impl VerificationParams {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            require_otp: false,
            token_header: VERIFICATION_TOKEN_HEADER.to_string(),
            token_field: VERIFICATION_TOKEN_FIELD.to_string(),
            otp_header: VERIFICATION_OTP_HEADER.to_string(),
            otp_field: VERIFICATION_OTP_FIELD.to_string(),
            subject: None,
            require_subject: false,
        }
    }

    /// Require a one-time code bound at issuance.
    pub fn with_otp(mut self) -> Self {
        self.require_otp = true;
        self
    }

    /// Resolve the expected subject from the request.
    pub fn with_subject(mut self, rule: Lookup) -> Self {
        self.subject = Some(rule);
        self
    }

    /// Reject tokens that carry no subject.
    pub fn with_required_subject(mut self) -> Self {
        self.require_subject = true;
        self
    }

    /// Override the token header name.
    pub fn with_token_header(mut self, name: impl Into<String>) -> Self {
        self.token_header = name.into();
        self
    }

    /// Override the token body/query field name.
    pub fn with_token_field(mut self, name: impl Into<String>) -> Self {
        self.token_field = name.into();
        self
    }

    /// Override the OTP header name.
    pub fn with_otp_header(mut self, name: impl Into<String>) -> Self {
        self.otp_header = name.into();
        self
    }

    /// Override the OTP body/query field name.
    pub fn with_otp_field(mut self, name: impl Into<String>) -> Self {
        self.otp_field = name.into();
        self
    }
}
