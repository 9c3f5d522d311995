// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the gateway's REST surface. All
//! types derive `Serialize`/`Deserialize` and `ToSchema` for JSON handling
//! and OpenAPI documentation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// =============================================================================
// Token Issuance
// =============================================================================

/// Request to mint an identity token for a subject.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// Subject the token is bound to.
    pub subject: String,
    /// Token lifetime in seconds (default one hour).
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Identity object embedded into the token and surfaced in the
    /// principal on later requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub identity: Option<Value>,
}

/// A freshly minted token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in_secs: u64,
}

// =============================================================================
// Verification Flow
// =============================================================================

/// Request to start a verification flow for one action.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartVerificationRequest {
    /// Action the token will be bound to (e.g. `reset_password`).
    pub action: String,
    /// Bind a one-time code; the caller must deliver it out-of-band and
    /// the consuming endpoint will demand it back.
    #[serde(default)]
    pub require_otp: bool,
}

/// A verification token, plus the bound one-time code when requested.
///
/// The OTP is returned exactly once, at issuance; delivery to the end user
/// (email, SMS, push) is an external collaborator's job.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartVerificationResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    pub expires_in_secs: u64,
}

/// Password-reset payload; consumed only after the verification token and
/// one-time code have been checked by the authentication layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// =============================================================================
// Webhooks
// =============================================================================

/// Acknowledgement returned for accepted (signature-verified) webhooks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    /// Event name, when the delivery declared one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

// =============================================================================
// Internal
// =============================================================================

/// Deployment status for the mTLS-protected internal surface.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InternalStatus {
    pub service: String,
    pub version: String,
    pub mtls: bool,
}
