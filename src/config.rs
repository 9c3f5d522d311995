// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and the [`TrustConfig`]
//! value holding all trust material. Configuration is loaded from the
//! environment exactly once at startup; nothing in this module is re-read
//! per request.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_HMAC_SECRET` | Shared secret for HMAC-signed payloads | Required |
//! | `AUTH_STATIC_SECRET` | Static bearer secret for service-to-service calls | Required |
//! | `AUTH_TOKEN_AUDIENCE` | Audience required on every accepted token | Required |
//! | `AUTH_TOKEN_KEY_AUTH_SERVICE` | HS256 key for tokens from the identity service | Required |
//! | `AUTH_TOKEN_KEY_GATEWAY` | HS256 key for tokens this gateway mints itself | Required |
//! | `AUTH_VERIFICATION_TTL_SECS` | Verification-token lifetime in seconds | `900` |
//! | `TLS_CERT_PATH` | Server certificate chain (PEM) | Required |
//! | `TLS_KEY_PATH` | Server private key (PEM) | Required |
//! | `TLS_CLIENT_CA_PATH` | CA bundle for client certificates (enables mTLS endpoints) | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, path::PathBuf, time::Duration};

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the shared HMAC payload secret.
pub const HMAC_SECRET_ENV: &str = "AUTH_HMAC_SECRET";

/// Environment variable name for the static bearer secret.
pub const STATIC_SECRET_ENV: &str = "AUTH_STATIC_SECRET";

/// Environment variable name for the required token audience.
pub const TOKEN_AUDIENCE_ENV: &str = "AUTH_TOKEN_AUDIENCE";

/// Environment variable name for the identity-service token key.
pub const AUTH_SERVICE_KEY_ENV: &str = "AUTH_TOKEN_KEY_AUTH_SERVICE";

/// Environment variable name for the gateway's own token key.
pub const GATEWAY_KEY_ENV: &str = "AUTH_TOKEN_KEY_GATEWAY";

/// Environment variable name for the verification-token TTL (seconds).
pub const VERIFICATION_TTL_ENV: &str = "AUTH_VERIFICATION_TTL_SECS";

/// Environment variable name for the server certificate chain path.
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";

/// Environment variable name for the server private key path.
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";

/// Environment variable name for the client-certificate CA bundle path.
pub const TLS_CLIENT_CA_ENV: &str = "TLS_CLIENT_CA_PATH";

/// Environment variable name for the logging format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default verification-token lifetime.
const DEFAULT_VERIFICATION_TTL: Duration = Duration::from_secs(900);

/// Configuration errors are fatal: the process refuses to serve rather than
/// run with an unusable strategy.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// TLS trust material locations, resolved at startup.
#[derive(Debug, Clone)]
pub struct TlsSettings {
    /// Server certificate chain (PEM).
    pub cert: PathBuf,
    /// Server private key (PEM).
    pub key: PathBuf,
    /// CA bundle used to verify client certificates. When present, mTLS
    /// endpoints become servable; when absent, they reject every request.
    pub client_ca: Option<PathBuf>,
}

/// All secret/key material the gateway trusts, loaded once at process start
/// and shared read-only across requests.
///
/// Secrets are deliberately excluded from the `Debug` output.
#[derive(Clone)]
pub struct TrustConfig {
    /// Shared secret for HMAC payload signatures.
    pub hmac_secret: String,
    /// Static bearer secret compared verbatim (constant-time) on STATIC endpoints.
    pub static_secret: String,
    /// Audience every accepted token must carry.
    pub audience: String,
    /// HS256 key for tokens issued by the platform identity service.
    pub auth_service_key: String,
    /// HS256 key for tokens this gateway mints itself (verification tokens).
    pub gateway_key: String,
    /// Lifetime of verification tokens.
    pub verification_ttl: Duration,
    /// TLS material locations.
    pub tls: TlsSettings,
}

impl std::fmt::Debug for TrustConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustConfig")
            .field("hmac_secret", &"<redacted>")
            .field("static_secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("auth_service_key", &"<redacted>")
            .field("gateway_key", &"<redacted>")
            .field("verification_ttl", &self.verification_ttl)
            .field("tls", &self.tls)
            .finish()
    }
}

impl TrustConfig {
    /// Load all trust material from the environment.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when any required variable is absent or
    /// unparsable. Callers treat this as fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let verification_ttl = match env::var(VERIFICATION_TTL_ENV) {
            Ok(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid(VERIFICATION_TTL_ENV, raw))?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_VERIFICATION_TTL,
        };

        Ok(Self {
            hmac_secret: env_required(HMAC_SECRET_ENV)?,
            static_secret: env_required(STATIC_SECRET_ENV)?,
            audience: env_required(TOKEN_AUDIENCE_ENV)?,
            auth_service_key: env_required(AUTH_SERVICE_KEY_ENV)?,
            gateway_key: env_required(GATEWAY_KEY_ENV)?,
            verification_ttl,
            tls: TlsSettings {
                cert: PathBuf::from(env_required(TLS_CERT_ENV)?),
                key: PathBuf::from(env_required(TLS_KEY_ENV)?),
                client_ca: env::var(TLS_CLIENT_CA_ENV).ok().map(PathBuf::from),
            },
        })
    }

    /// Whether mTLS endpoints can be served (a client CA is configured).
    pub fn mtls_enabled(&self) -> bool {
        self.tls.client_ca.is_some()
    }
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Read an environment variable, falling back to a default.
pub fn env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
