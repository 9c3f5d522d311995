// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Request authentication for the Relational Gateway. Every endpoint
//! declares one [`AuthStrategy`]; the dispatcher in [`middleware`] runs the
//! matching check before the handler and attaches a [`Principal`] to the
//! request.
//!
//! ## Strategies
//!
//! - `NONE` - open endpoint, anonymous principal
//! - `STATIC` - constant service secret as bearer token
//! - `JWT` - identity token from the platform auth service
//! - `HMAC` - payload signature, canonical or github-compatible mode
//! - `TLS` - transport-verified client certificate (mTLS)
//! - `VERIFICATION` - short-lived single-action token, optionally OTP-bound
//!
//! ## Security
//!
//! - Trust material is loaded once at startup; checks are in-memory only
//! - All secret comparisons are constant-time
//! - Failures render `{ "errorCode": ..., "hint"? }` and nothing else;
//!   raw credentials reach the log sink only in redacted form

pub mod error;
pub mod extract;
pub mod middleware;
pub mod principal;
pub mod signature;
pub mod static_token;
pub mod strategy;
pub mod token;
pub mod verification;

pub use error::AuthError;
pub use extract::Lookup;
pub use principal::{CurrentPrincipal, Principal};
pub use strategy::{AuthStrategy, HmacParams, VerificationParams};
pub use token::{Issuer, TokenCodec};
pub use verification::VerificationCodec;
