//! APM Injector - mutating admission webhook for the Elastic APM Java agent

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use apm_injector::server::{start_server, ServerConfig};
use apm_injector::telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use apm_injector::webhook::WebhookState;
use apm_injector::AgentConfig;

/// Inject the Elastic APM Java agent into pods at admission time
#[derive(Parser, Debug)]
#[command(name = "apm-injector", version, about, long_about = None)]
struct Cli {
    /// Path to the agent configuration YAML
    #[arg(
        long,
        env = "APM_INJECTOR_CONFIG",
        default_value = "/etc/apm-injector/config.yaml"
    )]
    config: PathBuf,

    /// Path to the TLS certificate PEM served to the API server
    #[arg(
        long,
        env = "APM_INJECTOR_TLS_CERT",
        default_value = "/etc/apm-injector/tls/tls.crt"
    )]
    tls_cert: PathBuf,

    /// Path to the TLS private key PEM
    #[arg(
        long,
        env = "APM_INJECTOR_TLS_KEY",
        default_value = "/etc/apm-injector/tls/tls.key"
    )]
    tls_key: PathBuf,

    /// Address to listen on
    #[arg(long, env = "APM_INJECTOR_ADDR", default_value = "0.0.0.0:8443")]
    addr: SocketAddr,

    /// Log output format (text or json)
    #[arg(long, env = "APM_INJECTOR_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("CRITICAL: Failed to install rustls crypto provider: {:?}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        format: cli.log_format,
    })?;

    let config = AgentConfig::load(&cli.config)?;
    info!(
        config = %cli.config.display(),
        variables = config.environment.len(),
        "Agent configuration loaded"
    );

    let server_config = ServerConfig::load(cli.addr, &cli.tls_cert, &cli.tls_key)?;
    let state = Arc::new(WebhookState::new(config));

    start_server(server_config, state).await?;
    Ok(())
}
