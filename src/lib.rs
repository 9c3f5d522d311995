// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Gateway - Edge Authentication Service
//!
//! This crate authenticates requests ahead of business handlers. Every
//! endpoint declares a strategy (static secret, identity token, HMAC
//! payload signature, mTLS, verification token, or none); the matching
//! check runs before the handler and attaches a normalized principal to
//! the request.
//!
//! ## Modules
//!
//! - `api` - HTTP API and endpoint descriptors (Axum)
//! - `auth` - Authentication strategies, codecs and dispatcher
//! - `config` - Environment-sourced trust material
//! - `tls` - Rustls server setup and per-connection metadata

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod tls;
