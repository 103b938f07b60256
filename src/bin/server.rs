use std::time::Duration;

use clap::Parser;
use sso_grpc::proto::auth_server::AuthServer;
use sso_grpc::server::{AuthGrpc, MemoryAuth, ServerConfig};
use tokio::signal;
use tonic::transport::Server;
use tonic_health::server::{health_reporter, HealthReporter};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "SSO gRPC authentication server", long_about = None)]
#[command(version)]
struct Args {
    /// Host to bind to (overrides config)
    #[arg(short = 'H', long, env = "SSO_SERVER__HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "SSO_SERVER__PORT")]
    port: Option<u16>,

    /// Enable the Prometheus metrics endpoint
    #[arg(long, env = "SSO_METRICS__ENABLED")]
    metrics: bool,

    /// Metrics port (overrides config)
    #[arg(long, env = "SSO_METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Rate limit requests per minute (overrides config)
    #[arg(long, env = "SSO_RATE_LIMIT__REQUESTS_PER_MINUTE")]
    rate_limit: Option<u64>,

    /// Rate limit burst (overrides config)
    #[arg(long, env = "SSO_RATE_LIMIT__BURST")]
    rate_burst: Option<u64>,

    /// Application id accepted by the in-memory development backend
    #[arg(long, env = "SSO_APP_ID", default_value = "1")]
    app_id: i32,
}

impl Args {
    fn apply(self, mut config: ServerConfig) -> (ServerConfig, bool, i32) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        if let Some(rpm) = self.rate_limit {
            config.rate_limit.requests_per_minute = rpm;
        }
        if let Some(burst) = self.rate_burst {
            config.rate_limit.burst = burst;
        }

        let metrics_enabled = self.metrics || config.metrics.enabled;
        (config, metrics_enabled, self.app_id)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        warn!("Failed to load configuration: {e}");
        info!("Using default configuration");
        ServerConfig::default()
    });

    let (config, metrics_enabled, app_id) = args.apply(config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {e}");
        return Err(format!("Invalid configuration: {e}").into());
    }

    let auth = MemoryAuth::new();
    auth.register_app(app_id).await;

    let rate_limiter = config.rate_limit.build_limiter();
    let service = AuthGrpc::new(auth.clone(), rate_limiter);

    if metrics_enabled {
        let metrics_addr = config.metrics.addr();
        tokio::spawn(async move {
            if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                error!("Failed to start metrics server: {e}");
            } else {
                info!("Metrics server started on {metrics_addr}");
            }
        });
    }

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<AuthServer<AuthGrpc<MemoryAuth>>>()
        .await;

    let addr = config.server.addr();

    info!("Server starting on {addr}");
    info!(
        "Rate limit: {} req/min, burst: {}",
        config.rate_limit.requests_per_minute, config.rate_limit.burst
    );
    info!(
        "Metrics: {}",
        if metrics_enabled { "enabled" } else { "disabled" }
    );
    info!("Accepted app id: {app_id}");

    Server::builder()
        .add_service(health_service)
        .add_service(AuthServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal(health_reporter))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(mut health_reporter: HealthReporter) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    health_reporter
        .set_not_serving::<AuthServer<AuthGrpc<MemoryAuth>>>()
        .await;

    info!("Initiating graceful shutdown (allowing in-flight requests to complete)");

    tokio::time::sleep(Duration::from_secs(2)).await;
}
