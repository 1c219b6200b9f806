//! Order confirmation listener.
//!
//! Binds one subscriber to the orders topic and sends a confirmation for
//! every order announced on it. Orders announced while it is not running
//! are never seen.

use api::config::Config;
use api::notify::listen_until;
use messaging::{NotificationListener, OrderEventPublisher, RedisBroadcast, TopicSpec};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn run(config: Config) -> Result<(), BoxError> {
    config.validate_timeouts()?;
    let redis_url = config
        .redis_url
        .as_deref()
        .ok_or("REDIS_URL must be set for the notifier")?;

    let broker = RedisBroadcast::connect(redis_url, config.connect_timeout).await?;
    let topic = TopicSpec::fanout(&config.orders_topic);

    // Either side may start first; both declare the same topic.
    OrderEventPublisher::new(broker.clone(), topic.clone())
        .declare()
        .await?;

    let payloads = broker.subscribe_stream(&topic.name).await?;
    tracing::info!(topic = %topic.name, "waiting for order events");

    let mut listener = NotificationListener::new();
    listen_until(&mut listener, payloads, tokio::signal::ctrl_c()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "notifier stopped");
        std::process::exit(1);
    }
}
