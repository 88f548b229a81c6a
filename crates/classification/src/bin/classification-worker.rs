use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use triage_broker::RedisBroker;
use triage_core::config::{env_or, env_u16, load_dotenv, BrokerConfig, ModelConfig};
use triage_pipeline::metrics_router;

#[derive(Parser, Debug)]
#[command(name = "classification-worker")]
struct Cli {
    #[arg(long, env = "CLASSIFICATION_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "CLASSIFICATION_PORT", default_value_t = 8003)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_or("LOGLEVEL", "info")))
        .init();

    let cli = Cli::parse();
    let port = env_u16("CLASSIFICATION_PORT", cli.port).unwrap_or(cli.port);

    let model_config = ModelConfig::from_env()?;

    let classification_metrics = Arc::new(classification::ClassificationMetrics::new());
    let deps = classification::ClassificationDeps {
        http: reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?,
        model_base_url: model_config.base_url,
        metrics: classification_metrics.clone(),
    };

    let broker_config = BrokerConfig::from_env()?;
    let broker = Arc::new(RedisBroker::connect(&broker_config).await?);
    let stage = classification::build_stage(broker, deps);
    let metrics = stage.metrics();
    metrics.register(Box::new(classification_metrics.successful_requests.clone()));
    metrics.register(Box::new(classification_metrics.failed_requests.clone()));
    metrics.register(Box::new(classification_metrics.event_types.clone()));
    metrics.register(Box::new(classification_metrics.score_histogram.clone()));
    let shutdown = Arc::new(Notify::new());

    let stage_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { stage.run(shutdown).await })
    };

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), port)).await?;
    tracing::info!(host = %cli.host, port, "classification admin endpoint listening");
    axum::serve(listener, metrics_router(metrics)).await?;

    shutdown.notify_waiters();
    let _ = stage_task.await;
    Ok(())
}
