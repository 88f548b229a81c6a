use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use triage_broker::RedisBroker;
use triage_core::config::{env_or, env_u16, load_dotenv, BrokerConfig, PlatformConfig, VerificationConfig};
use triage_pipeline::metrics_router;
use triage_platform::{PlatformClient, PlatformMetrics};

#[derive(Parser, Debug)]
#[command(name = "retrieval-worker")]
struct Cli {
    #[arg(long, env = "RETRIEVAL_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "RETRIEVAL_PORT", default_value_t = 8002)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_or("LOGLEVEL", "info")))
        .init();

    let cli = Cli::parse();
    let port = env_u16("RETRIEVAL_PORT", cli.port).unwrap_or(cli.port);

    let platform_config = PlatformConfig::from_env()?;
    let verification_config = VerificationConfig::from_env()?;

    let platform_metrics = Arc::new(PlatformMetrics::new());
    let deps = retrieval::RetrievalDeps {
        platform: Arc::new(
            PlatformClient::new(platform_config.base_url, platform_config.token, Duration::from_secs(10))
                .with_metrics(platform_metrics.clone()),
        ),
        http: reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?,
        verify_email_url: verification_config.base_url,
    };

    let broker_config = BrokerConfig::from_env()?;
    let broker = Arc::new(RedisBroker::connect(&broker_config).await?);
    let stage = retrieval::build_stage(broker, deps);
    let metrics = stage.metrics();
    metrics.register(Box::new(platform_metrics.call_duration.clone()));
    metrics.register(Box::new(platform_metrics.calls_total.clone()));
    let shutdown = Arc::new(Notify::new());

    let stage_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { stage.run(shutdown).await })
    };

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), port)).await?;
    tracing::info!(host = %cli.host, port, "retrieval admin endpoint listening");
    axum::serve(listener, metrics_router(metrics)).await?;

    shutdown.notify_waiters();
    let _ = stage_task.await;
    Ok(())
}
