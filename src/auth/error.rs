// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! This is the client-facing failure taxonomy of the authentication layer.
//! Component-level errors ([`TokenError`], [`VerificationError`]) collapse
//! into these variants before anything is rendered; status and code are the
//! only machine-visible surface, the optional hint stays short and free of
//! secret material.
//!
//! [`TokenError`]: super::token::TokenError
//! [`VerificationError`]: super::verification::VerificationError

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::token::TokenError;
use super::verification::VerificationError;

/// Client-facing authentication failure.
#[derive(Debug)]
pub enum AuthError {
    /// Missing/malformed credentials or a signature/token/secret mismatch.
    Unauthorized(Option<&'static str>),
    /// Required verification token absent from header, body and query.
    VerificationTokenMissing,
    /// One-time code required but not supplied.
    VerificationOtpMissing,
    /// Verification token present but unusable for this operation.
    VerificationFailed(Option<&'static str>),
    /// Internal failure; detail goes to the log sink, never to the client.
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    #[serde(rename = "errorCode")]
    error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

impl AuthError {
    pub fn unauthorized() -> Self {
        AuthError::Unauthorized(None)
    }

    pub fn unauthorized_hint(hint: &'static str) -> Self {
        AuthError::Unauthorized(Some(hint))
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthorized(_) => "unauthorized",
            AuthError::VerificationTokenMissing => "verification_token_missing",
            AuthError::VerificationOtpMissing => "verification_otp_missing",
            AuthError::VerificationFailed(_) => "verification_failed",
            AuthError::Internal(_) => "server-error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::VerificationTokenMissing | AuthError::VerificationOtpMissing => {
                StatusCode::BAD_REQUEST
            }
            AuthError::VerificationFailed(_) => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            AuthError::Unauthorized(hint) | AuthError::VerificationFailed(hint) => *hint,
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthorized(None) => write!(f, "Credentials missing or rejected"),
            AuthError::Unauthorized(Some(hint)) => {
                write!(f, "Credentials missing or rejected: {hint}")
            }
            AuthError::VerificationTokenMissing => write!(f, "Verification token is required"),
            AuthError::VerificationOtpMissing => write!(f, "One-time code is required"),
            AuthError::VerificationFailed(None) => write!(f, "Verification token rejected"),
            AuthError::VerificationFailed(Some(hint)) => {
                write!(f, "Verification token rejected: {hint}")
            }
            AuthError::Internal(detail) => write!(f, "Internal authentication error: {detail}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Token-codec failures surface to clients as a plain 401; the specific
/// reason is only hinted at when it is safe and actionable.
impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => AuthError::unauthorized_hint("token expired"),
            _ => AuthError::unauthorized(),
        }
    }
}

impl From<VerificationError> for AuthError {
    fn from(error: VerificationError) -> Self {
        match error {
            VerificationError::TokenMissing => AuthError::VerificationTokenMissing,
            VerificationError::OtpMissing => AuthError::VerificationOtpMissing,
            VerificationError::OtpMismatch => {
                AuthError::VerificationFailed(Some("one-time code mismatch"))
            }
            VerificationError::OtpNotBound => {
                AuthError::VerificationFailed(Some("token carries no one-time code"))
            }
            VerificationError::ActionMismatch => {
                AuthError::VerificationFailed(Some("token issued for a different action"))
            }
            VerificationError::SubjectMismatch | VerificationError::SubjectRequired => {
                AuthError::VerificationFailed(Some("subject binding violation"))
            }
            VerificationError::Token(TokenError::Expired) => {
                AuthError::VerificationFailed(Some("token expired"))
            }
            VerificationError::Token(_) => AuthError::VerificationFailed(None),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!("internal authentication error: {detail}");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error_code: self.error_code(),
            hint: self.hint(),
        });
        (status, body).into_response()
    }
}
