// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principals and the handler-side extractor.
//!
//! A [`Principal`] is the normalized result of a successful authentication,
//! attached to the request extensions by the dispatcher and discarded when
//! the request ends. Handlers read it through [`CurrentPrincipal`]:
//!
//! ```rust,ignore
//! async fn profile(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
//!     Json(principal)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::error::AuthError;

/// Normalized authentication result, one variant per strategy family.
///
/// Presence-only strategies (STATIC, HMAC, TLS) carry no claims; token
/// strategies carry whatever identity the token embedded.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// Unauthenticated endpoint; nothing was checked.
    Anonymous,
    /// Caller presented the static service secret.
    Static,
    /// Payload carried a valid HMAC signature.
    Hmac,
    /// Transport-level client certificate was verified.
    Tls,
    /// Caller presented a valid identity token.
    User {
        issuer: String,
        subject: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[schema(value_type = Object)]
        identity: Option<Value>,
    },
    /// Caller presented a valid verification token.
    Verification {
        action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        otp_verified: bool,
    },
}

impl Principal {
    /// Subject this principal is bound to, when there is one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Principal::User { subject, .. } => Some(subject),
            Principal::Verification { subject, .. } => subject.as_deref(),
            _ => None,
        }
    }

    /// Whether any credential was actually checked.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Principal::Anonymous)
    }
}

/// Extractor for the principal attached by the authentication dispatcher.
///
/// Reaching a handler without a principal means the endpoint was registered
/// without the authentication layer; that is a wiring bug, reported as an
/// internal error rather than a client failure.
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| {
                AuthError::Internal("handler reached without authentication middleware".to_string())
            })
    }
}
