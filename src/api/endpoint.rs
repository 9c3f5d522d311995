// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoint descriptors.
//!
//! An [`Endpoint`] binds path, method, authentication strategy, an optional
//! schema check and a handler into one ordered pipeline:
//!
//! ```text
//! authentication -> validation -> handler
//! ```
//!
//! Registration is pure configuration: layers are attached to the router,
//! no I/O happens. The descriptor is consumed by [`Endpoint::register`], so
//! an endpoint's strategy cannot change after registration.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    handler::Handler,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use serde_json::Value;

use crate::auth::{middleware::authenticate, AuthStrategy};
use crate::error::ApiError;
use crate::state::AppState;

/// Body-schema check bound at registration. The gateway does not define
/// schemas itself; callers plug in whatever validator the service uses.
pub type SchemaCheck = fn(&Value) -> Result<(), String>;

/// Upper bound on bodies buffered for schema checks.
const MAX_VALIDATED_BODY_BYTES: usize = 1 << 20;

/// Declarative endpoint: path, method, strategy, optional schema, handler.
pub struct Endpoint {
    path: &'static str,
    method: MethodFilter,
    strategy: AuthStrategy,
    schema: Option<SchemaCheck>,
}

impl Endpoint {
    pub fn new(path: &'static str, method: MethodFilter, strategy: AuthStrategy) -> Self {
        Self {
            path,
            method,
            strategy,
            schema: None,
        }
    }

    pub fn get(path: &'static str, strategy: AuthStrategy) -> Self {
        Self::new(path, MethodFilter::GET, strategy)
    }

    pub fn post(path: &'static str, strategy: AuthStrategy) -> Self {
        Self::new(path, MethodFilter::POST, strategy)
    }

    /// Attach a body-schema check, run after authentication and before the
    /// handler.
    pub fn with_schema(mut self, check: SchemaCheck) -> Self {
        self.schema = Some(check);
        self
    }

    /// Register onto the router, wiring the pipeline layers.
    pub fn register<H, T>(self, router: Router<AppState>, state: &AppState, handler: H) -> Router<AppState>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let mut route = on(self.method, handler);
        if let Some(check) = self.schema {
            route = route.route_layer(middleware::from_fn(
                move |request: Request, next: Next| validate(check, request, next),
            ));
        }
        // Added last, runs first: authentication precedes validation.
        route = route.route_layer(middleware::from_fn_with_state(
            (state.clone(), Arc::new(self.strategy)),
            authenticate,
        ));
        router.route(self.path, route)
    }
}

async fn validate(check: SchemaCheck, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_VALIDATED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::invalid_request("unreadable request body").into_response(),
    };

    if !bytes.is_empty() {
        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => return ApiError::invalid_request("body must be JSON").into_response(),
        };
        if let Err(reason) = check(&value) {
            return ApiError::invalid_request(reason).into_response();
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
