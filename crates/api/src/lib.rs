//! HTTP checkout service.
//!
//! Exposes `POST /checkout` and `GET /orders` behind bearer-token
//! authentication, with structured logging (tracing) and Prometheus
//! metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{CheckoutOrchestrator, Collaborators, InMemoryCartService, StubPaymentService};
use messaging::{InMemoryBroadcast, OrderEventPublisher, TopicSpec};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::JwtVerifier;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: CheckoutOrchestrator,
    pub verifier: JwtVerifier,
}

impl AppState {
    pub fn new(orchestrator: CheckoutOrchestrator, verifier: JwtVerifier) -> Self {
        Self {
            orchestrator,
            verifier,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
///
/// Checkout routes are served both at the root and under `/api`.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let checkout_routes = Router::new()
        .route("/checkout", post(routes::checkout::create))
        .route("/orders", get(routes::orders::list));

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(checkout_routes.clone())
        .nest("/api", checkout_routes)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-process collaborators, for local runs and tests.
#[derive(Clone, Default)]
pub struct InMemoryServices {
    pub cart: InMemoryCartService,
    pub payment: StubPaymentService,
    pub orders: InMemoryOrderStore,
    pub broker: InMemoryBroadcast,
}

impl InMemoryServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires these services into collaborator handles publishing to `topic`.
    pub fn collaborators(&self, topic: TopicSpec) -> Collaborators {
        Collaborators {
            cart: Arc::new(self.cart.clone()),
            payment: Arc::new(self.payment.clone()),
            orders: Arc::new(self.orders.clone()),
            events: Arc::new(OrderEventPublisher::new(self.broker.clone(), topic)),
        }
    }
}

/// Creates application state backed entirely by in-memory services.
///
/// The orders topic is declared before returning.
pub async fn create_default_state(
    jwt_secret: &str,
) -> messaging::Result<(Arc<AppState>, InMemoryServices)> {
    let services = InMemoryServices::new();
    let publisher = OrderEventPublisher::new(services.broker.clone(), TopicSpec::orders());
    publisher.declare().await?;

    let orchestrator = CheckoutOrchestrator::new(services.collaborators(TopicSpec::orders()));
    let state = Arc::new(AppState::new(orchestrator, JwtVerifier::new(jwt_secret)));
    Ok((state, services))
}
