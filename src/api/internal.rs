// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::models::InternalStatus;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/v1/internal/status",
    tag = "Internal",
    responses(
        (status = 200, body = InternalStatus),
        (status = 401, description = "No verified client certificate on the connection")
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<InternalStatus> {
    Json(InternalStatus {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mtls: state.trust.mtls_enabled(),
    })
}
