//! Checkout service entry point.

use std::sync::Arc;

use api::AppState;
use api::auth::JwtVerifier;
use api::config::Config;
use checkout::{CheckoutOrchestrator, Collaborators, HttpCartClient, StubPaymentService};
use messaging::{
    EventPublisher, InMemoryBroadcast, OrderEventPublisher, RedisBroadcast, TopicSpec,
};
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Opens the order store: PostgreSQL when configured, memory otherwise.
async fn order_store(config: &Config) -> Result<Arc<dyn OrderStore>, BoxError> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresOrderStore::connect(url, config.connect_timeout).await?;
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL order store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            Ok(Arc::new(InMemoryOrderStore::new()))
        }
    }
}

/// Connects the event publisher and declares the orders topic.
async fn event_publisher(config: &Config) -> Result<Arc<dyn EventPublisher>, BoxError> {
    let topic = TopicSpec::fanout(&config.orders_topic);
    match &config.redis_url {
        Some(url) => {
            let broker = RedisBroadcast::connect(url, config.connect_timeout).await?;
            let publisher = OrderEventPublisher::new(broker, topic);
            publisher.declare().await?;
            tracing::info!(topic = %publisher.topic().name, "using Redis broadcast");
            Ok(Arc::new(publisher))
        }
        None => {
            tracing::warn!("REDIS_URL not set, order events stay in process");
            let publisher = OrderEventPublisher::new(InMemoryBroadcast::new(), topic);
            publisher.declare().await?;
            Ok(Arc::new(publisher))
        }
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    config.validate()?;

    // 1. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 2. Connect collaborators
    let collaborators = Collaborators {
        cart: Arc::new(HttpCartClient::new(
            &config.cart_service_url,
            config.call_timeout,
        )?),
        payment: Arc::new(StubPaymentService::new()),
        orders: order_store(&config).await?,
        events: event_publisher(&config).await?,
    };

    // 3. Build the application
    let orchestrator = CheckoutOrchestrator::with_timeout(collaborators, config.call_timeout);
    let state = Arc::new(AppState::new(
        orchestrator,
        JwtVerifier::new(&config.jwt_secret),
    ));
    let app = api::create_app(state, metrics_handle);

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, cart_url = %config.cart_service_url, "starting checkout service");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
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
        tracing::error!(error = %e, "checkout service failed to start");
        std::process::exit(1);
    }
}
