// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential extraction.
//!
//! Strategies that accept credentials from more than one location describe
//! them as an ordered list of [`Lookup`] rules; the first rule yielding a
//! non-empty value wins. An absent field and a present-but-empty field are
//! deliberately the same thing: empty strings never authenticate and never
//! shadow a value further down the priority order.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde_json::Value;

/// One place a credential may be found.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// A request header, by name.
    Header(String),
    /// A top-level string field of the JSON request body.
    BodyField(String),
    /// A query-string parameter.
    QueryField(String),
}

/// Read-only view of the request surfaces a [`Lookup`] can address.
pub(crate) struct CredentialSource<'a> {
    pub headers: &'a HeaderMap,
    pub query: Option<&'a str>,
    pub body: Option<&'a Value>,
}

impl CredentialSource<'_> {
    /// Evaluate rules in priority order; first non-empty value wins.
    pub fn first(&self, rules: &[Lookup]) -> Option<String> {
        rules.iter().find_map(|rule| self.lookup(rule))
    }

    fn lookup(&self, rule: &Lookup) -> Option<String> {
        let raw = match rule {
            Lookup::Header(name) => self
                .headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            Lookup::BodyField(name) => self
                .body
                .and_then(|body| body.get(name.as_str()))
                .and_then(Value::as_str)
                .map(str::to_owned),
            Lookup::QueryField(name) => self.query.and_then(|query| query_param(query, name)),
        }?;

        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Extract the token of an `Authorization: Bearer <token>` header.
///
/// Missing header, non-bearer scheme and empty token all return `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Shorten a credential for the failure log: enough to correlate, never
/// enough to replay.
pub fn redact(value: &str) -> String {
    const VISIBLE: usize = 6;
    if value.chars().count() <= VISIBLE {
        "***".to_string()
    } else {
        let prefix: String = value.chars().take(VISIBLE).collect();
        format!("{prefix}***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn rules() -> Vec<Lookup> {
        vec![
            Lookup::Header("x-verification-token".to_string()),
            Lookup::BodyField("verificationToken".to_string()),
            Lookup::QueryField("verificationToken".to_string()),
        ]
    }

    #[test]
    fn header_wins_over_body_and_query() {
        let headers = headers(&[("x-verification-token", "from-header")]);
        let body = json!({"verificationToken": "from-body"});
        let source = CredentialSource {
            headers: &headers,
            query: Some("verificationToken=from-query"),
            body: Some(&body),
        };
        assert_eq!(source.first(&rules()).as_deref(), Some("from-header"));
    }

    #[test]
    fn body_wins_over_query() {
        let headers = HeaderMap::new();
        let body = json!({"verificationToken": "from-body"});
        let source = CredentialSource {
            headers: &headers,
            query: Some("verificationToken=from-query"),
            body: Some(&body),
        };
        assert_eq!(source.first(&rules()).as_deref(), Some("from-body"));
    }

    #[test]
    fn query_is_the_last_resort() {
        let headers = HeaderMap::new();
        let source = CredentialSource {
            headers: &headers,
            query: Some("other=1&verificationToken=from-query"),
            body: None,
        };
        assert_eq!(source.first(&rules()).as_deref(), Some("from-query"));
    }

    #[test]
    fn empty_values_do_not_shadow_lower_priority_rules() {
        let headers = headers(&[("x-verification-token", "")]);
        let body = json!({"verificationToken": "from-body"});
        let source = CredentialSource {
            headers: &headers,
            query: None,
            body: Some(&body),
        };
        assert_eq!(source.first(&rules()).as_deref(), Some("from-body"));
    }

    #[test]
    fn non_string_body_fields_are_ignored() {
        let headers = HeaderMap::new();
        let body = json!({"verificationToken": 12345});
        let source = CredentialSource {
            headers: &headers,
            query: None,
            body: Some(&body),
        };
        assert_eq!(source.first(&rules()), None);
    }

    #[test]
    fn bearer_token_parsing() {
        let map = headers(&[("authorization", "Bearer abc123")]);
        assert_eq!(bearer_token(&map), Some("abc123"));

        let map = headers(&[("authorization", "Basic abc123")]);
        assert_eq!(bearer_token(&map), None);

        let map = headers(&[("authorization", "Bearer ")]);
        assert_eq!(bearer_token(&map), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn redact_keeps_only_a_prefix() {
        assert_eq!(redact("supersecrettoken"), "supers***");
        assert_eq!(redact("short"), "***");
    }
}
