// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{extract::State, Json};

use crate::auth::token::ClaimsDraft;
use crate::auth::Issuer;
use crate::error::ApiError;
use crate::models::{IssueTokenRequest, TokenResponse};
use crate::state::AppState;

/// Default lifetime of minted identity tokens.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[utoipa::path(
    post,
    path = "/v1/tokens",
    tag = "Identity",
    request_body = IssueTokenRequest,
    responses(
        (status = 200, body = TokenResponse),
        (status = 401, description = "Missing or rejected service secret")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<IssueTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let ttl = Duration::from_secs(request.ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS));
    let draft = ClaimsDraft {
        subject: Some(request.subject),
        identity: request.identity,
        ..Default::default()
    };
    let token = state
        .tokens
        .issue(Issuer::AuthService, draft, ttl)
        .map_err(ApiError::internal)?;
    Ok(Json(TokenResponse {
        token,
        expires_in_secs: ttl.as_secs(),
    }))
}
