// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{TokenCodec, VerificationCodec};
use crate::config::TrustConfig;

/// Shared application state: the read-only trust configuration and the
/// codecs derived from it, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub trust: Arc<TrustConfig>,
    pub tokens: Arc<TokenCodec>,
    pub verification: Arc<VerificationCodec>,
}

impl AppState {
    pub fn new(trust: TrustConfig) -> Self {
        let tokens = Arc::new(TokenCodec::new(&trust));
        let verification = Arc::new(VerificationCodec::new(
            tokens.clone(),
            trust.verification_ttl,
        ));
        Self {
            trust: Arc::new(trust),
            tokens,
            verification,
        }
    }
}
