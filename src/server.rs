//! Webhook HTTPS server
//!
//! The API server only calls admission webhooks over TLS, so the router is
//! always served through rustls.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use tracing::info;

use crate::webhook::{webhook_router, WebhookState};
use crate::{Error, Result};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// TLS certificate PEM
    pub cert_pem: String,
    /// TLS private key PEM
    pub key_pem: String,
}

impl ServerConfig {
    /// Build a server config, reading the certificate and key from PEM files
    pub fn load(
        addr: SocketAddr,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self> {
        Ok(Self {
            addr,
            cert_pem: read_pem(cert_path.as_ref())?,
            key_pem: read_pem(key_path.as_ref())?,
        })
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("cert_pem", &self.cert_pem)
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

fn read_pem(path: &Path) -> Result<String> {
    let pem = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
    if !pem.contains("-----BEGIN ") {
        return Err(Error::config(format!(
            "{} does not contain PEM data",
            path.display()
        )));
    }
    Ok(pem)
}

/// Start the webhook server and serve until it fails
pub async fn start_server(config: ServerConfig, state: Arc<WebhookState>) -> Result<()> {
    let app = webhook_router(state);

    let tls_config =
        RustlsConfig::from_pem(config.cert_pem.into_bytes(), config.key_pem.into_bytes())
            .await
            .map_err(|e| Error::config(format!("TLS config error: {}", e)))?;

    info!(addr = %config.addr, "Starting webhook server");

    axum_server::bind_rustls(config.addr, tls_config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| Error::server(e.to_string()))?;

    Ok(())
}
