use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use triage_broker::RedisBroker;
use triage_core::config::{env_or, env_u16, load_dotenv, BrokerConfig, PlatformConfig, TrustFilesConfig};
use triage_platform::{PlatformClient, PlatformMetrics};
use verification::{app, build_stage, TrustState, VerificationState};

#[derive(Parser, Debug)]
#[command(name = "verification-worker")]
struct Cli {
    #[arg(long, env = "VERIFICATION_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "VERIFICATION_PORT", default_value_t = 8001)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_or("LOGLEVEL", "info")))
        .init();

    let cli = Cli::parse();
    let port = env_u16("VERIFICATION_PORT", cli.port).unwrap_or(cli.port);

    let trust_files = TrustFilesConfig::from_env()?;
    let trust = TrustState::load(trust_files.domains_file, trust_files.users_file)?;
    trust.spawn_sighup_reloader();

    let platform_config = PlatformConfig::from_env()?;
    let platform_metrics = Arc::new(PlatformMetrics::new());
    let platform = Arc::new(
        PlatformClient::new(platform_config.base_url, platform_config.token, Duration::from_secs(10))
            .with_metrics(platform_metrics.clone()),
    );

    let broker_config = BrokerConfig::from_env()?;
    let broker: Arc<dyn triage_broker::Broker> = Arc::new(RedisBroker::connect(&broker_config).await?);
    let stage = build_stage(broker.clone(), trust.clone(), platform);
    let metrics = stage.metrics();
    metrics.register(Box::new(platform_metrics.call_duration.clone()));
    metrics.register(Box::new(platform_metrics.calls_total.clone()));
    let shutdown = Arc::new(Notify::new());

    let stage_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { stage.run(shutdown).await })
    };

    let state = VerificationState { trust, metrics };
    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), port)).await?;
    tracing::info!(host = %cli.host, port, "verification listening");
    axum::serve(listener, app(state)).await?;

    shutdown.notify_waiters();
    let _ = stage_task.await;
    Ok(())
}
