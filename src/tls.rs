// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TLS server configuration.
//!
//! Loads PEM trust material from the paths in [`TlsSettings`] and builds the
//! rustls server config. TLS is mandatory; there is no plaintext fallback.
//!
//! When a client CA bundle is configured, the handshake verifies any
//! presented client certificate against it (certificates remain optional at
//! the transport so public endpoints keep working). Whether a verified
//! client certificate was presented is recorded per connection as a
//! [`TlsConnection`] request extension; the authentication layer's mTLS
//! check asserts that flag and nothing more - no chain logic is redone
//! above the transport.

use std::{
    fs::File,
    future::Future,
    io::{self, BufReader},
    path::Path,
    pin::Pin,
    sync::Arc,
};

use axum_server::accept::Accept;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use rustls_pemfile::{certs, ec_private_keys, pkcs8_private_keys};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tower_http::add_extension::AddExtension;

use crate::config::TlsSettings;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("no usable PEM material in {path}")]
    Parse { path: String },

    #[error("client certificate verifier rejected the CA bundle: {0}")]
    ClientVerifier(String),

    #[error("TLS server configuration rejected: {0}")]
    Config(String),
}

/// Per-connection TLS metadata, attached to every request on the listener.
#[derive(Debug, Clone, Copy)]
pub struct TlsConnection {
    /// A client certificate was presented and verified during the
    /// handshake against the configured CA bundle.
    pub client_certificate_verified: bool,
}

/// Build the rustls server config from the configured trust material.
///
/// # Errors
/// Any unreadable or unparsable PEM input is fatal; the process must not
/// serve with partial trust material.
pub fn server_config(settings: &TlsSettings) -> Result<ServerConfig, TlsError> {
    let cert_chain = load_cert_chain(&settings.cert)?;
    let key = load_private_key(&settings.key)?;

    let builder = match &settings.client_ca {
        Some(ca_path) => {
            let roots = load_root_store(ca_path)?;
            // Certificates stay optional at the transport; presenting an
            // invalid one still aborts the handshake.
            let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
                .allow_unauthenticated()
                .build()
                .map_err(|e| TlsError::ClientVerifier(e.to_string()))?;
            ServerConfig::builder().with_client_cert_verifier(verifier)
        }
        None => ServerConfig::builder().with_no_client_auth(),
    };

    let mut config = builder
        .with_single_cert(cert_chain, key)
        .map_err(|e| TlsError::Config(e.to_string()))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open(path)?;
    let chain: Vec<CertificateDer<'static>> = certs(&mut reader)
        .collect::<Result<_, _>>()
        .map_err(|_| parse_error(path))?;
    if chain.is_empty() {
        return Err(parse_error(path));
    }
    Ok(chain)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open(path)?;
    if let Some(key) = pkcs8_private_keys(&mut reader)
        .next()
        .and_then(Result::ok)
    {
        return Ok(key.into());
    }

    let mut reader = open(path)?;
    if let Some(key) = ec_private_keys(&mut reader).next().and_then(Result::ok) {
        return Ok(key.into());
    }

    Err(parse_error(path))
}

fn load_root_store(path: &Path) -> Result<RootCertStore, TlsError> {
    let mut store = RootCertStore::empty();
    for cert in load_cert_chain(path)? {
        store.add(cert).map_err(|_| parse_error(path))?;
    }
    Ok(store)
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path).map(BufReader::new).map_err(|source| TlsError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn parse_error(path: &Path) -> TlsError {
    TlsError::Parse {
        path: path.display().to_string(),
    }
}

/// Rustls acceptor that records handshake metadata onto every request via a
/// [`TlsConnection`] extension.
#[derive(Clone)]
pub struct TlsInfoAcceptor {
    inner: RustlsAcceptor,
}

impl TlsInfoAcceptor {
    pub fn new(config: RustlsConfig) -> Self {
        Self {
            inner: RustlsAcceptor::new(config),
        }
    }
}

impl<I, S> Accept<I, S> for TlsInfoAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    S: Send + 'static,
{
    type Stream = TlsStream<I>;
    type Service = AddExtension<S, TlsConnection>;
    type Future = Pin<Box<dyn Future<Output = io::Result<(Self::Stream, Self::Service)>> + Send>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let acceptor = self.inner.clone();
        Box::pin(async move {
            let (stream, service) = acceptor.accept(stream, service).await?;
            let (_, session) = stream.get_ref();
            let connection = TlsConnection {
                client_certificate_verified: session
                    .peer_certificates()
                    .is_some_and(|chain| !chain.is_empty()),
            };
            Ok((stream, AddExtension::new(service, connection)))
        })
    }
}
