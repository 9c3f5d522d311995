// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::auth::{CurrentPrincipal, Principal};

#[utoipa::path(
    get,
    path = "/v1/profile",
    tag = "Identity",
    responses(
        (status = 200, body = Principal),
        (status = 401, description = "Missing or rejected identity token")
    )
)]
pub async fn profile(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_the_attached_principal() {
        let principal = Principal::User {
            issuer: "auth_service".to_string(),
            subject: "user_42".to_string(),
            identity: None,
        };
        let Json(echoed) = profile(CurrentPrincipal(principal)).await;
        assert_eq!(echoed.subject(), Some("user_42"));
    }
}
