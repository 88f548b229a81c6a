use std::sync::Arc;

use clap::Parser;
use ingress::{app, IngressMetrics, IngressState};
use tracing_subscriber::EnvFilter;
use triage_broker::RedisBroker;
use triage_core::config::{env_or, env_u16, load_dotenv, BrokerConfig};

#[derive(Parser, Debug)]
#[command(name = "ingress-worker")]
struct Cli {
    #[arg(long, env = "INGRESS_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "INGRESS_PORT", default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_or("LOGLEVEL", "info")))
        .init();

    let cli = Cli::parse();
    let port = env_u16("INGRESS_PORT", cli.port).unwrap_or(cli.port);

    let broker_config = BrokerConfig::from_env()?;
    let state = IngressState {
        broker: Arc::new(RedisBroker::connect(&broker_config).await?),
        metrics: Arc::new(IngressMetrics::new()),
    };

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), port)).await?;
    tracing::info!(host = %cli.host, port, "ingress listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
