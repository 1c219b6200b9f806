//! Integration tests for the checkout orchestrator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use checkout::{
    CartFailure, CartService, CheckoutError, CheckoutOrchestrator, CheckoutState, Collaborators,
    InMemoryCartService, PaymentService, StubPaymentService,
};
use common::{Credential, OrderId, VerifiedIdentity};
use domain::{CartLine, Money, Order, OrderCreatedEvent, OrderStatus};
use messaging::{Broadcaster, EventPublisher, InMemoryBroadcast, OrderEventPublisher, TopicSpec};
use order_store::{InMemoryOrderStore, OrderStore};
use tokio::sync::broadcast;

struct TestHarness {
    orchestrator: CheckoutOrchestrator,
    cart: InMemoryCartService,
    payment: StubPaymentService,
    orders: InMemoryOrderStore,
    broker: InMemoryBroadcast,
    subscriber: broadcast::Receiver<String>,
}

impl TestHarness {
    async fn new() -> Self {
        Self::with_payment(None).await
    }

    async fn with_payment(payment_override: Option<Arc<dyn PaymentService>>) -> Self {
        let cart = InMemoryCartService::new();
        let payment = StubPaymentService::new();
        let orders = InMemoryOrderStore::new();
        let broker = InMemoryBroadcast::new();

        let publisher = OrderEventPublisher::new(broker.clone(), TopicSpec::orders());
        publisher.declare().await.unwrap();
        let subscriber = broker.subscribe(&TopicSpec::orders().name).await.unwrap();

        let payment_handle: Arc<dyn PaymentService> = match payment_override {
            Some(custom) => custom,
            None => Arc::new(payment.clone()),
        };

        let orchestrator = CheckoutOrchestrator::new(Collaborators {
            cart: Arc::new(cart.clone()),
            payment: payment_handle,
            orders: Arc::new(orders.clone()),
            events: Arc::new(publisher),
        });

        Self {
            orchestrator,
            cart,
            payment,
            orders,
            broker,
            subscriber,
        }
    }
}

fn ada() -> VerifiedIdentity {
    VerifiedIdentity::new("ada@example.com")
}

fn bearer() -> Credential {
    Credential::new("Bearer token-ada")
}

fn line(sku: &str, quantity: u32, cents: i64) -> CartLine {
    CartLine::new(
        format!("prod-{sku}"),
        sku,
        format!("Item {sku}"),
        quantity,
        Money::from_cents(cents),
    )
    .unwrap()
}

struct DecliningPayment;

#[async_trait]
impl PaymentService for DecliningPayment {
    async fn charge(&self, _: &VerifiedIdentity, _: Money) -> Result<bool, CheckoutError> {
        Ok(false)
    }
}

struct SlowCart {
    delay: Duration,
}

#[async_trait]
impl CartService for SlowCart {
    async fn fetch_cart(
        &self,
        _: &VerifiedIdentity,
        _: &Credential,
    ) -> Result<Vec<CartLine>, CheckoutError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![line("A1", 1, 100)])
    }

    async fn clear_cart(&self, _: &VerifiedIdentity, _: &Credential) -> Result<(), CheckoutError> {
        Ok(())
    }
}

struct SlowClearCart {
    delay: Duration,
}

#[async_trait]
impl CartService for SlowClearCart {
    async fn fetch_cart(
        &self,
        _: &VerifiedIdentity,
        _: &Credential,
    ) -> Result<Vec<CartLine>, CheckoutError> {
        Ok(vec![line("A1", 1, 100)])
    }

    async fn clear_cart(&self, _: &VerifiedIdentity, _: &Credential) -> Result<(), CheckoutError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

struct SlowPublisher {
    delay: Duration,
}

#[async_trait]
impl EventPublisher for SlowPublisher {
    async fn publish_order_created(&self, _: &OrderCreatedEvent) -> messaging::Result<usize> {
        tokio::time::sleep(self.delay).await;
        Ok(1)
    }
}

struct SlowOrderStore {
    inner: InMemoryOrderStore,
    delay: Duration,
}

#[async_trait]
impl OrderStore for SlowOrderStore {
    async fn create_order(
        &self,
        owner: &VerifiedIdentity,
        lines: Vec<CartLine>,
    ) -> order_store::Result<Order> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_order(owner, lines).await
    }

    async fn get_order(&self, id: OrderId) -> order_store::Result<Option<Order>> {
        self.inner.get_order(id).await
    }

    async fn list_orders_for_owner(
        &self,
        owner: &VerifiedIdentity,
    ) -> order_store::Result<Vec<Order>> {
        self.inner.list_orders_for_owner(owner).await
    }
}

const SHORT_TIMEOUT: Duration = Duration::from_millis(50);
const LONG_DELAY: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_checkout_happy_path() {
    let mut h = TestHarness::new().await;
    h.cart.set_cart(&ada(), vec![line("A1", 2, 1000)]).await;

    let outcome = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    let order = &outcome.order;
    assert_eq!(order.owner, ada());
    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 2);
    assert_eq!(order.lines[0].line_total, Money::from_cents(2000));
    assert!(outcome.event_published);
    assert!(outcome.cart_cleared);
    assert_eq!(
        outcome.trace,
        vec![
            CheckoutState::ReadingCart,
            CheckoutState::Charging,
            CheckoutState::Persisting,
            CheckoutState::Publishing,
            CheckoutState::ClearingCart,
            CheckoutState::Responding,
        ]
    );

    let stored = h.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(&stored, order);

    let payload = h.subscriber.recv().await.unwrap();
    let event = OrderCreatedEvent::from_json(&payload).unwrap();
    assert_eq!(&event.order, order);

    assert!(h.cart.lines(&ada()).await.is_empty());
    assert_eq!(h.payment.charge_count(), 1);
}

#[tokio::test]
async fn test_order_lines_match_cart_in_order() {
    let h = TestHarness::new().await;
    let lines = vec![line("C3", 1, 250), line("A1", 3, 99), line("B2", 2, 1000)];
    h.cart.set_cart(&ada(), lines.clone()).await;

    let outcome = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    assert_eq!(outcome.order.lines, lines);
    assert_eq!(outcome.order.total(), Some(Money::from_cents(250 + 297 + 2000)));
}

#[tokio::test]
async fn test_empty_cart_is_rejected_without_side_effects() {
    let mut h = TestHarness::new().await;

    let err = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(h.payment.charge_count(), 0);
    assert_eq!(h.orders.order_count().await, 0);
    assert!(h.subscriber.try_recv().is_err());
    assert_eq!(h.cart.clear_count(), 0);
}

#[tokio::test]
async fn test_cart_failure_aborts_before_charge() {
    let h = TestHarness::new().await;
    h.cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;
    h.cart.set_fetch_failure(Some(CartFailure::Status(502))).await;

    let err = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::CartRejected { status: 502 }));
    assert_eq!(h.payment.charge_count(), 0);
    assert_eq!(h.orders.order_count().await, 0);
    assert_eq!(h.cart.lines(&ada()).await.len(), 1);
}

#[tokio::test]
async fn test_declined_payment_writes_nothing() {
    let mut h = TestHarness::with_payment(Some(Arc::new(DecliningPayment))).await;
    h.cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;

    let err = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::PaymentDeclined));
    assert_eq!(h.orders.order_count().await, 0);
    assert!(h.subscriber.try_recv().is_err());
    assert_eq!(h.cart.lines(&ada()).await.len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_skips_publish_and_clear() {
    let mut h = TestHarness::new().await;
    h.cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;
    h.orders.set_fail_on_create(true);

    let err = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Persistence(_)));
    assert!(h.subscriber.try_recv().is_err());
    assert_eq!(h.cart.clear_count(), 0);
    assert_eq!(h.cart.lines(&ada()).await.len(), 1);
}

#[tokio::test]
async fn test_publish_failure_still_succeeds() {
    let h = TestHarness::new().await;
    h.cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;
    h.broker.set_fail_on_publish(true);

    let outcome = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    assert!(!outcome.event_published);
    assert!(outcome.cart_cleared);
    assert!(h.orders.get_order(outcome.order.id).await.unwrap().is_some());
    assert!(h.cart.lines(&ada()).await.is_empty());
}

#[tokio::test]
async fn test_clear_failure_still_succeeds() {
    let mut h = TestHarness::new().await;
    h.cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;
    h.cart.set_fail_on_clear(true);

    let outcome = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    assert!(outcome.event_published);
    assert!(!outcome.cart_cleared);
    assert_eq!(h.orders.order_count().await, 1);
    assert!(h.subscriber.recv().await.is_ok());
    // A later checkout would see the same lines again.
    assert_eq!(h.cart.lines(&ada()).await.len(), 1);
}

#[tokio::test]
async fn test_publish_with_no_subscribers_succeeds() {
    let h = TestHarness::new().await;
    let TestHarness {
        orchestrator,
        cart,
        subscriber,
        ..
    } = h;
    drop(subscriber);
    cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;

    let outcome = orchestrator.checkout(&ada(), &bearer()).await.unwrap();
    assert!(outcome.event_published);
}

#[tokio::test]
async fn test_credential_is_forwarded_to_cart() {
    let h = TestHarness::new().await;
    h.cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;

    h.orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    assert_eq!(
        h.cart.credentials_seen().await,
        vec!["Bearer token-ada".to_string(), "Bearer token-ada".to_string()]
    );
}

#[tokio::test]
async fn test_slow_cart_times_out() {
    let orders = InMemoryOrderStore::new();
    let broker = InMemoryBroadcast::new();
    broker.declare_topic(&TopicSpec::orders()).await.unwrap();

    let orchestrator = CheckoutOrchestrator::with_timeout(
        Collaborators {
            cart: Arc::new(SlowCart { delay: LONG_DELAY }),
            payment: Arc::new(StubPaymentService::new()),
            orders: Arc::new(orders.clone()),
            events: Arc::new(OrderEventPublisher::new(broker, TopicSpec::orders())),
        },
        SHORT_TIMEOUT,
    );

    let err = orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::CartUnavailable(_)));
    assert_eq!(orders.order_count().await, 0);
}

#[tokio::test]
async fn test_slow_publish_times_out_but_checkout_succeeds() {
    let cart = InMemoryCartService::new();
    cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;
    let orders = InMemoryOrderStore::new();

    let orchestrator = CheckoutOrchestrator::with_timeout(
        Collaborators {
            cart: Arc::new(cart.clone()),
            payment: Arc::new(StubPaymentService::new()),
            orders: Arc::new(orders.clone()),
            events: Arc::new(SlowPublisher { delay: LONG_DELAY }),
        },
        SHORT_TIMEOUT,
    );

    let outcome = orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    assert!(!outcome.event_published);
    assert!(outcome.cart_cleared);
    assert_eq!(outcome.trace.last(), Some(&CheckoutState::Responding));
    assert!(orders.get_order(outcome.order.id).await.unwrap().is_some());
    assert!(cart.lines(&ada()).await.is_empty());
}

#[tokio::test]
async fn test_slow_clear_times_out_but_checkout_succeeds() {
    let orders = InMemoryOrderStore::new();
    let broker = InMemoryBroadcast::new();
    let publisher = OrderEventPublisher::new(broker.clone(), TopicSpec::orders());
    publisher.declare().await.unwrap();
    let mut subscriber = broker.subscribe(&TopicSpec::orders().name).await.unwrap();

    let orchestrator = CheckoutOrchestrator::with_timeout(
        Collaborators {
            cart: Arc::new(SlowClearCart { delay: LONG_DELAY }),
            payment: Arc::new(StubPaymentService::new()),
            orders: Arc::new(orders.clone()),
            events: Arc::new(publisher),
        },
        SHORT_TIMEOUT,
    );

    let outcome = orchestrator.checkout(&ada(), &bearer()).await.unwrap();

    assert!(outcome.event_published);
    assert!(!outcome.cart_cleared);
    assert_eq!(orders.order_count().await, 1);
    assert!(subscriber.recv().await.is_ok());
}

#[tokio::test]
async fn test_slow_order_store_times_out_and_aborts() {
    let cart = InMemoryCartService::new();
    cart.set_cart(&ada(), vec![line("A1", 1, 100)]).await;
    let orders = InMemoryOrderStore::new();
    let broker = InMemoryBroadcast::new();
    let publisher = OrderEventPublisher::new(broker.clone(), TopicSpec::orders());
    publisher.declare().await.unwrap();
    let mut subscriber = broker.subscribe(&TopicSpec::orders().name).await.unwrap();

    let orchestrator = CheckoutOrchestrator::with_timeout(
        Collaborators {
            cart: Arc::new(cart.clone()),
            payment: Arc::new(StubPaymentService::new()),
            orders: Arc::new(SlowOrderStore {
                inner: orders.clone(),
                delay: LONG_DELAY,
            }),
            events: Arc::new(publisher),
        },
        SHORT_TIMEOUT,
    );

    let err = orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Persistence(_)));
    assert_eq!(orders.order_count().await, 0);
    assert!(subscriber.try_recv().is_err());
    assert_eq!(cart.clear_count(), 0);
    assert_eq!(cart.lines(&ada()).await.len(), 1);
}

#[tokio::test]
async fn test_cart_total_overflow_aborts_before_charge() {
    let h = TestHarness::new().await;
    let half = i64::MAX / 2 + 1;
    h.cart
        .set_cart(&ada(), vec![line("A1", 1, half), line("B2", 1, half)])
        .await;

    let err = h.orchestrator.checkout(&ada(), &bearer()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::CartDecode(_)));
    assert_eq!(h.payment.charge_count(), 0);
    assert_eq!(h.orders.order_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_checkouts_are_independent() {
    let h = TestHarness::new().await;
    let owners: Vec<_> = (0..8)
        .map(|i| VerifiedIdentity::new(format!("user{i}@example.com")))
        .collect();
    for owner in &owners {
        h.cart.set_cart(owner, vec![line("A1", 1, 100)]).await;
    }

    let handles: Vec<_> = owners
        .iter()
        .cloned()
        .map(|owner| {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move { orchestrator.checkout(&owner, &bearer()).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(h.orders.order_count().await, 8);
    for owner in &owners {
        let mine = h.orders.list_orders_for_owner(owner).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(&mine[0].owner, owner);
    }
}
