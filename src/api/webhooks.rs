// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{http::HeaderMap, Json};
use serde_json::Value;

use crate::models::WebhookAck;

#[utoipa::path(
    post,
    path = "/v1/webhooks/ingest",
    tag = "Webhooks",
    responses(
        (status = 200, body = WebhookAck),
        (status = 401, description = "Missing or invalid payload signature")
    )
)]
pub async fn ingest(Json(event): Json<Value>) -> Json<WebhookAck> {
    // The embedded signature was already stripped and checked upstream.
    let event_name = event
        .get("event")
        .and_then(Value::as_str)
        .map(str::to_string);
    Json(WebhookAck {
        received: true,
        event: event_name,
    })
}

#[utoipa::path(
    post,
    path = "/v1/webhooks/github",
    tag = "Webhooks",
    responses(
        (status = 200, body = WebhookAck),
        (status = 401, description = "Missing or invalid signature header")
    )
)]
pub async fn github(headers: HeaderMap, Json(event): Json<Value>) -> Json<WebhookAck> {
    // Github names the event in a header, not the payload.
    let event_name = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| event.get("action").and_then(Value::as_str).map(str::to_string));
    Json(WebhookAck {
        received: true,
        event: event_name,
    })
}
