use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use triage_broker::RedisBroker;
use triage_core::config::{env_or, env_u16, load_dotenv, BrokerConfig, ChatConfig};
use triage_pipeline::metrics_router;

#[derive(Parser, Debug)]
#[command(name = "notification-worker")]
struct Cli {
    #[arg(long, env = "NOTIFICATION_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "NOTIFICATION_PORT", default_value_t = 8004)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_or("LOGLEVEL", "info")))
        .init();

    let cli = Cli::parse();
    let port = env_u16("NOTIFICATION_PORT", cli.port).unwrap_or(cli.port);

    let chat_config = ChatConfig::from_env()?;

    let notification_metrics = Arc::new(notification::NotificationMetrics::new());
    let deps = notification::NotificationDeps {
        http: reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?,
        webhook_url: chat_config.webhook_url,
        metrics: notification_metrics.clone(),
    };

    let broker_config = BrokerConfig::from_env()?;
    let broker = Arc::new(RedisBroker::connect(&broker_config).await?);
    let stage = notification::build_stage(broker, deps);
    let metrics = stage.metrics();
    metrics.register(Box::new(notification_metrics.delivered.clone()));
    metrics.register(Box::new(notification_metrics.failed.clone()));
    let shutdown = Arc::new(Notify::new());

    let stage_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { stage.run(shutdown).await })
    };

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), port)).await?;
    tracing::info!(host = %cli.host, port, "notification admin endpoint listening");
    axum::serve(listener, metrics_router(metrics)).await?;

    shutdown.notify_waiters();
    let _ = stage_task.await;
    Ok(())
}
