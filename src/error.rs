// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-facing API errors.
//!
//! Every error rendered to a client carries a machine-readable `errorCode`
//! and, optionally, a short human-oriented `hint`. Internal detail never
//! crosses this boundary: unrecognized errors collapse into a generic 500
//! with code `server-error`, and the original error goes to the tracing
//! sink instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: &'static str,
    pub hint: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "errorCode")]
    error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str) -> Self {
        Self {
            status,
            error_code,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found")
    }

    pub fn invalid_request(hint: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request").with_hint(hint)
    }

    /// Global error boundary: log the original error, render a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!("internal error: {detail}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "server-error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error_code: self.error_code,
            hint: self.hint,
        });
        (self.status, body).into_response()
    }
}
