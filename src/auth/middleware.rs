// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication dispatcher.
//!
//! Per-endpoint middleware bound at registration by the endpoint
//! descriptor. Dispatches exhaustively on the declared [`AuthStrategy`],
//! produces a [`Principal`] into the request extensions, or terminates the
//! pipeline with a client-safe [`AuthError`] before the handler runs.
//!
//! Failures are never retried here; the caller must re-issue the request
//! with corrected credentials. Every failure is reported to the tracing
//! sink with the strategy name and redacted credential material.
//!
//! Strategies that authenticate the request body (HMAC, VERIFICATION)
//! buffer it and hand an identical copy to the handler.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::tls::TlsConnection;

use super::error::AuthError;
use super::extract::{bearer_token, redact, CredentialSource, Lookup};
use super::principal::Principal;
use super::signature::{self, SignatureMode, SIGNATURE_FIELD};
use super::static_token;
use super::strategy::{AuthStrategy, HmacParams, VerificationParams, GITHUB_SIGNATURE_HEADER};
use super::token::Issuer;
use super::verification::{VerificationError, VerifyOptions};

/// Upper bound on bodies buffered for signature/token checks.
const MAX_AUTHENTICATED_BODY_BYTES: usize = 1 << 20;

/// Middleware entry point; the endpoint descriptor installs this ahead of
/// the handler with the endpoint's strategy as state.
pub async fn authenticate(
    State((state, strategy)): State<(AppState, Arc<AuthStrategy>)>,
    request: Request,
    next: Next,
) -> Response {
    match check(&state, &strategy, request).await {
        Ok((mut request, principal)) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(error) => {
            debug!(
                strategy = strategy.name(),
                error = %error,
                "authentication failed"
            );
            error.into_response()
        }
    }
}

async fn check(
    state: &AppState,
    strategy: &AuthStrategy,
    request: Request,
) -> Result<(Request, Principal), AuthError> {
    match strategy {
        AuthStrategy::None => Ok((request, Principal::Anonymous)),

        AuthStrategy::Static => {
            let token = bearer_token(request.headers())
                .ok_or_else(|| AuthError::unauthorized_hint("missing bearer token"))?;
            if !static_token::check(token, &state.trust.static_secret) {
                debug!(token = %redact(token), "static token mismatch");
                return Err(AuthError::unauthorized());
            }
            Ok((request, Principal::Static))
        }

        AuthStrategy::Jwt => {
            let token = bearer_token(request.headers())
                .ok_or_else(|| AuthError::unauthorized_hint("missing bearer token"))?;
            let claims = state
                .tokens
                .verify(token, Issuer::AuthService)
                .map_err(|error| {
                    debug!(token = %redact(token), error = %error, "identity token rejected");
                    AuthError::from(error)
                })?;
            let subject = claims
                .sub
                .ok_or_else(|| AuthError::unauthorized_hint("token carries no subject"))?;
            let principal = Principal::User {
                issuer: claims.iss,
                subject,
                identity: claims.identity,
            };
            Ok((request, principal))
        }

        AuthStrategy::Hmac(params) => check_hmac(state, params, request).await,

        AuthStrategy::Tls => {
            let verified = request
                .extensions()
                .get::<TlsConnection>()
                .is_some_and(|conn| conn.client_certificate_verified);
            if !verified {
                // Chain validation happened (or not) at the TLS handshake;
                // nothing is re-checked here.
                warn!("mTLS endpoint reached without a verified client certificate");
                return Err(AuthError::unauthorized_hint("client certificate required"));
            }
            Ok((request, Principal::Tls))
        }

        AuthStrategy::Verification(params) => check_verification(state, params, request).await,
    }
}

async fn check_hmac(
    state: &AppState,
    params: &HmacParams,
    request: Request,
) -> Result<(Request, Principal), AuthError> {
    let secret = params
        .secret
        .as_deref()
        .unwrap_or(&state.trust.hmac_secret)
        .as_bytes()
        .to_vec();

    let (parts, body) = request.into_parts();
    let bytes = read_body(body).await?;

    let valid = if params.github {
        let presented = parts
            .headers
            .get(GITHUB_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::unauthorized_hint("missing signature header"))?;
        signature::verify(&bytes, presented, &secret, SignatureMode::Github)
    } else {
        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|_| AuthError::unauthorized_hint("unsigned payload"))?;
        let presented = payload
            .get(SIGNATURE_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::unauthorized_hint("missing signature"))?
            .to_string();
        signature::verify(&bytes, &presented, &secret, SignatureMode::Standard)
    };

    if !valid {
        return Err(AuthError::unauthorized());
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok((request, Principal::Hmac))
}

async fn check_verification(
    state: &AppState,
    params: &VerificationParams,
    request: Request,
) -> Result<(Request, Principal), AuthError> {
    let (parts, body) = request.into_parts();
    let bytes = read_body(body).await?;
    let body_json: Option<Value> = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };

    let source = CredentialSource {
        headers: &parts.headers,
        query: parts.uri.query(),
        body: body_json.as_ref(),
    };

    let token = source
        .first(&[
            Lookup::Header(params.token_header.clone()),
            Lookup::BodyField(params.token_field.clone()),
            Lookup::QueryField(params.token_field.clone()),
        ])
        .ok_or(AuthError::VerificationTokenMissing)?;

    let otp = source.first(&[
        Lookup::Header(params.otp_header.clone()),
        Lookup::BodyField(params.otp_field.clone()),
        Lookup::QueryField(params.otp_field.clone()),
    ]);
    if params.require_otp && otp.is_none() {
        return Err(AuthError::from(VerificationError::OtpMissing));
    }

    let subject = params
        .subject
        .as_ref()
        .and_then(|rule| source.first(std::slice::from_ref(rule)));

    let payload = state
        .verification
        .verify(
            &token,
            VerifyOptions {
                action: &params.action,
                otp: otp.as_deref(),
                require_otp: params.require_otp,
                subject: subject.as_deref(),
                require_subject: params.require_subject,
                issuer: None,
            },
        )
        .map_err(|error| {
            debug!(token = %redact(&token), error = %error, "verification token rejected");
            AuthError::from(error)
        })?;

    let principal = Principal::Verification {
        action: payload.action,
        subject: payload.subject,
        otp_verified: payload.otp_verified,
    };
    let request = Request::from_parts(parts, Body::from(bytes));
    Ok((request, principal))
}

async fn read_body(body: Body) -> Result<Bytes, AuthError> {
    axum::body::to_bytes(body, MAX_AUTHENTICATED_BODY_BYTES)
        .await
        .map_err(|_| AuthError::unauthorized_hint("unreadable request body"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::principal::CurrentPrincipal;
    use crate::auth::signature;
    use crate::auth::verification::IssueOptions;
    use crate::test_support::test_state;
    use axum::http::{header, Method, StatusCode};
    use axum::routing::post;
    use axum::{middleware, Json, Router};
    use tower::ServiceExt;

    async fn principal_echo(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
        Json(principal)
    }

    fn builder() -> axum::http::request::Builder {
        axum::http::Request::builder()
    }

    fn app(strategy: AuthStrategy) -> Router {
        let state = test_state();
        Router::new()
            .route("/probe", post(principal_echo))
            .route_layer(middleware::from_fn_with_state(
                (state, Arc::new(strategy)),
                authenticate,
            ))
    }

    fn request(builder: axum::http::request::Builder, body: &str) -> Request {
        builder
            .method(Method::POST)
            .uri("/probe")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn none_strategy_attaches_anonymous_principal() {
        let response = app(AuthStrategy::None)
            .oneshot(request(builder(), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["kind"], "anonymous");
    }

    #[tokio::test]
    async fn static_strategy_accepts_the_configured_secret() {
        let response = app(AuthStrategy::Static)
            .oneshot(request(
                builder().header(header::AUTHORIZATION, "Bearer static-secret"),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn static_strategy_rejects_everything_else() {
        for auth_header in [Some("Bearer wrong"), Some("Basic static-secret"), None] {
            let mut builder = builder();
            if let Some(value) = auth_header {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            let response = app(AuthStrategy::Static)
                .oneshot(request(builder, "{}"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(response).await["errorCode"], "unauthorized");
        }
    }

    #[tokio::test]
    async fn jwt_strategy_builds_a_user_principal() {
        let state = test_state();
        let token = state
            .tokens
            .issue(
                Issuer::AuthService,
                crate::auth::token::ClaimsDraft {
                    subject: Some("user_42".to_string()),
                    ..Default::default()
                },
                std::time::Duration::from_secs(60),
            )
            .unwrap();

        let response = app(AuthStrategy::Jwt)
            .oneshot(request(
                builder().header(header::AUTHORIZATION, format!("Bearer {token}")),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "user");
        assert_eq!(body["subject"], "user_42");
        assert_eq!(body["issuer"], "auth_service");
    }

    #[tokio::test]
    async fn jwt_strategy_rejects_verification_tokens() {
        // Gateway-issued tokens are signed with a different key.
        let state = test_state();
        let token = state
            .verification
            .issue("reset_password", None, IssueOptions::default())
            .unwrap();

        let response = app(AuthStrategy::Jwt)
            .oneshot(request(
                builder().header(header::AUTHORIZATION, format!("Bearer {token}")),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn hmac_standard_accepts_embedded_signature() {
        let unsigned = br#"{"test":"test"}"#;
        let sig = signature::sign(unsigned, b"hmac-secret", SignatureMode::Standard).unwrap();
        let body = format!(r#"{{"test":"test","signature":"{sig}"}}"#);

        let response = app(AuthStrategy::Hmac(HmacParams::default()))
            .oneshot(request(builder(), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["kind"], "hmac");
    }

    #[tokio::test]
    async fn hmac_standard_rejects_wrong_secret() {
        let unsigned = br#"{"test":"test"}"#;
        let sig = signature::sign(unsigned, b"wrong-secret", SignatureMode::Standard).unwrap();
        let body = format!(r#"{{"test":"test","signature":"{sig}"}}"#);

        let response = app(AuthStrategy::Hmac(HmacParams::default()))
            .oneshot(request(builder(), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["errorCode"], "unauthorized");
    }

    #[tokio::test]
    async fn hmac_standard_rejects_missing_signature() {
        let response = app(AuthStrategy::Hmac(HmacParams::default()))
            .oneshot(request(builder(), r#"{"test":"test"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn hmac_github_reads_the_signature_header() {
        let body = r#"{"z":"v","a":{"z":"w","a":"x"}}"#;
        let sig = signature::sign(body.as_bytes(), b"hmac-secret", SignatureMode::Github).unwrap();

        let response = app(AuthStrategy::Hmac(HmacParams {
            github: true,
            ..Default::default()
        }))
        .oneshot(request(
            builder().header(GITHUB_SIGNATURE_HEADER, sig),
            body,
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn hmac_github_missing_header_is_unauthorized() {
        let response = app(AuthStrategy::Hmac(HmacParams {
            github: true,
            ..Default::default()
        }))
        .oneshot(request(builder(), r#"{"a":1}"#))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn hmac_endpoint_secret_override_wins() {
        let unsigned = br#"{"test":"test"}"#;
        let sig = signature::sign(unsigned, b"endpoint-secret", SignatureMode::Standard).unwrap();
        let body = format!(r#"{{"test":"test","signature":"{sig}"}}"#);

        let response = app(AuthStrategy::Hmac(HmacParams {
            secret: Some("endpoint-secret".to_string()),
            github: false,
        }))
        .oneshot(request(builder(), &body))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tls_strategy_requires_connection_metadata() {
        let response = app(AuthStrategy::Tls)
            .oneshot(request(builder(), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut verified = request(builder(), "{}");
        verified.extensions_mut().insert(TlsConnection {
            client_certificate_verified: true,
        });
        let response = app(AuthStrategy::Tls).oneshot(verified).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["kind"], "tls");
    }

    #[tokio::test]
    async fn verification_token_lookup_walks_header_body_query() {
        let state = test_state();
        let token = state
            .verification
            .issue("reset_password", None, IssueOptions::default())
            .unwrap();
        let strategy =
            || AuthStrategy::Verification(VerificationParams::new("reset_password"));

        // Header.
        let response = app(strategy())
            .oneshot(request(
                builder().header("x-verification-token", token.as_str()),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Body field.
        let body = format!(r#"{{"verificationToken":"{token}"}}"#);
        let response = app(strategy())
            .oneshot(request(builder(), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Query field.
        let response = app(strategy())
            .oneshot(
                builder()
                    .method(Method::POST)
                    .uri(format!("/probe?verificationToken={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn verification_missing_token_is_a_400() {
        let strategy = AuthStrategy::Verification(VerificationParams::new("reset_password"));
        let response = app(strategy)
            .oneshot(request(builder(), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["errorCode"],
            "verification_token_missing"
        );
    }

    #[tokio::test]
    async fn verification_otp_flow_distinguishes_missing_and_wrong() {
        let state = test_state();
        let token = state
            .verification
            .issue(
                "reset_password",
                None,
                IssueOptions {
                    otp: Some("123456".to_string()),
                    ttl: None,
                },
            )
            .unwrap();
        let strategy =
            || AuthStrategy::Verification(VerificationParams::new("reset_password").with_otp());

        let missing = app(strategy())
            .oneshot(request(
                builder().header("x-verification-token", token.as_str()),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(missing).await["errorCode"],
            "verification_otp_missing"
        );

        let wrong = app(strategy())
            .oneshot(request(
                builder()
                    .header("x-verification-token", token.as_str())
                    .header("x-verification-otp", "000000"),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(wrong).await["errorCode"], "verification_failed");

        let right = app(strategy())
            .oneshot(request(
                builder()
                    .header("x-verification-token", token.as_str())
                    .header("x-verification-otp", "123456"),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(right.status(), StatusCode::OK);
        let body = body_json(right).await;
        assert_eq!(body["kind"], "verification");
        assert_eq!(body["otp_verified"], true);
    }

    #[tokio::test]
    async fn verification_action_mismatch_is_forbidden() {
        let state = test_state();
        let token = state
            .verification
            .issue("reset_password", None, IssueOptions::default())
            .unwrap();

        let strategy = AuthStrategy::Verification(VerificationParams::new("delete_account"));
        let response = app(strategy)
            .oneshot(request(
                builder().header("x-verification-token", token.as_str()),
                "{}",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["errorCode"], "verification_failed");
    }

    #[tokio::test]
    async fn verification_subject_is_resolved_from_the_request() {
        let state = test_state();
        let token = state
            .verification
            .issue("reset_password", Some("u@example.com"), IssueOptions::default())
            .unwrap();
        let strategy = || {
            AuthStrategy::Verification(
                VerificationParams::new("reset_password")
                    .with_subject(Lookup::BodyField("email".to_string())),
            )
        };

        let body = format!(r#"{{"verificationToken":"{token}","email":"u@example.com"}}"#);
        let response = app(strategy())
            .oneshot(request(builder(), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = format!(r#"{{"verificationToken":"{token}","email":"evil@example.com"}}"#);
        let response = app(strategy())
            .oneshot(request(builder(), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn handler_still_sees_the_buffered_body() {
        async fn echo(body: String) -> String {
            body
        }

        let state = test_state();
        let unsigned = br#"{"test":"test"}"#;
        let sig = signature::sign(unsigned, b"hmac-secret", SignatureMode::Standard).unwrap();
        let payload = format!(r#"{{"test":"test","signature":"{sig}"}}"#);

        let app = Router::new()
            .route("/probe", post(echo))
            .route_layer(middleware::from_fn_with_state(
                (
                    state,
                    Arc::new(AuthStrategy::Hmac(HmacParams::default())),
                ),
                authenticate,
            ));

        let response = app
            .oneshot(request(builder(), &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes, payload.as_bytes());
    }
}
