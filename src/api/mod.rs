// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP API assembly.
//!
//! Every route is declared as an [`Endpoint`] descriptor carrying its
//! authentication strategy; registration wires the dispatcher ahead of the
//! handler. Unknown paths fall through to the generic `not_found` body so
//! no axum default leaks.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthStrategy, HmacParams, Principal, VerificationParams};
use crate::error::ApiError;
use crate::models::{
    InternalStatus, IssueTokenRequest, ResetPasswordRequest, StartVerificationRequest,
    StartVerificationResponse, TokenResponse, WebhookAck,
};
use crate::state::AppState;

pub mod endpoint;
pub mod health;
pub mod internal;
pub mod profile;
pub mod tokens;
pub mod verification;
pub mod webhooks;

pub use endpoint::Endpoint;

pub fn router(state: AppState) -> Router {
    let routes = Router::new();
    let routes = Endpoint::get("/health", AuthStrategy::None)
        .register(routes, &state, health::health);
    let routes = Endpoint::get("/ready", AuthStrategy::None)
        .register(routes, &state, health::ready);
    let routes = Endpoint::get("/v1/profile", AuthStrategy::Jwt)
        .register(routes, &state, profile::profile);
    let routes = Endpoint::post("/v1/tokens", AuthStrategy::Static)
        .register(routes, &state, tokens::issue_token);
    let routes = Endpoint::post("/v1/verification/start", AuthStrategy::Jwt)
        .register(routes, &state, verification::start_verification);
    let routes = Endpoint::post(
        "/v1/account/reset-password",
        AuthStrategy::Verification(
            VerificationParams::new(verification::RESET_PASSWORD_ACTION).with_otp(),
        ),
    )
    .register(routes, &state, verification::reset_password);
    let routes = Endpoint::post(
        "/v1/webhooks/ingest",
        AuthStrategy::Hmac(HmacParams::default()),
    )
    .register(routes, &state, webhooks::ingest);
    let routes = Endpoint::post(
        "/v1/webhooks/github",
        AuthStrategy::Hmac(HmacParams {
            github: true,
            ..Default::default()
        }),
    )
    .register(routes, &state, webhooks::github);
    let routes = Endpoint::get("/v1/internal/status", AuthStrategy::Tls)
        .register(routes, &state, internal::status);

    routes
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::ready,
        profile::profile,
        tokens::issue_token,
        verification::start_verification,
        verification::reset_password,
        webhooks::ingest,
        webhooks::github,
        internal::status
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            health::ReadyChecks,
            Principal,
            IssueTokenRequest,
            TokenResponse,
            StartVerificationRequest,
            StartVerificationResponse,
            ResetPasswordRequest,
            WebhookAck,
            InternalStatus
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Identity", description = "Identity tokens and principals"),
        (name = "Verification", description = "Single-action verification flows"),
        (name = "Webhooks", description = "HMAC-authenticated ingestion"),
        (name = "Internal", description = "mTLS-only internal surface")
    )
)]
struct ApiDoc;
