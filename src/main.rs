// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc};

use axum_server::tls_rustls::RustlsConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relational_auth_gateway::api::router;
use relational_auth_gateway::config::{self, TrustConfig};
use relational_auth_gateway::state::AppState;
use relational_auth_gateway::tls::{self, TlsInfoAcceptor};

#[tokio::main]
async fn main() {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    init_tracing();

    // Missing trust material is fatal: refuse to serve rather than run
    // with an unusable strategy.
    let trust = match TrustConfig::from_env() {
        Ok(trust) => trust,
        Err(err) => {
            error!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let tls_config = match tls::server_config(&trust.tls) {
        Ok(server_config) => RustlsConfig::from_config(Arc::new(server_config)),
        Err(err) => {
            error!("TLS configuration error: {err}");
            std::process::exit(1);
        }
    };

    let mtls = trust.mtls_enabled();
    let state = AppState::new(trust);
    let app = router(state);

    // Parse bind address
    let host = config::env_or_default(config::HOST_ENV, "0.0.0.0");
    let port: u16 = config::env_or_default(config::PORT_ENV, "8080")
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    info!("Relational Gateway listening on https://{addr} (docs at /docs)");
    info!(
        mtls,
        "client certificate verification {}",
        if mtls { "enabled" } else { "disabled" }
    );

    // Start HTTPS server (TLS is mandatory - no HTTP fallback)
    axum_server::bind(addr)
        .acceptor(TlsInfoAcceptor::new(tls_config))
        .serve(app.into_make_service())
        .await
        .expect("HTTPS server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    if config::env_or_default(config::LOG_FORMAT_ENV, "pretty") == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
