//! Checkout orchestrator.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Credential, VerifiedIdentity};
use domain::{Money, Order, OrderCreatedEvent};
use messaging::{EventPublisher, PublishError};
use order_store::{OrderStore, OrderStoreError};

use crate::error::{CheckoutError, ErrorClass};
use crate::services::cart::CartService;
use crate::services::payment::PaymentService;
use crate::state::CheckoutState;

/// Per-call timeout applied to every collaborator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Long-lived collaborator handles, built once at startup.
///
/// Every handle is safe to share across concurrent checkouts.
#[derive(Clone)]
pub struct Collaborators {
    pub cart: Arc<dyn CartService>,
    pub payment: Arc<dyn PaymentService>,
    pub orders: Arc<dyn OrderStore>,
    pub events: Arc<dyn EventPublisher>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// The persisted order, returned to the caller as-is.
    pub order: Order,
    /// States visited, in order.
    pub trace: Vec<CheckoutState>,
    /// Whether the `order_created` broadcast went out.
    pub event_published: bool,
    /// Whether the cart was cleared.
    pub cart_cleared: bool,
}

/// Drives one checkout per call through the fixed step sequence.
///
/// Holds no per-request state; concurrent checkouts share only the
/// collaborator handles.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    deps: Collaborators,
    call_timeout: Duration,
}

impl CheckoutOrchestrator {
    /// Creates an orchestrator with the default per-call timeout.
    pub fn new(deps: Collaborators) -> Self {
        Self::with_timeout(deps, DEFAULT_CALL_TIMEOUT)
    }

    /// Creates an orchestrator with a custom per-call timeout.
    pub fn with_timeout(deps: Collaborators, call_timeout: Duration) -> Self {
        Self { deps, call_timeout }
    }

    /// Returns the collaborator handles.
    pub fn collaborators(&self) -> &Collaborators {
        &self.deps
    }

    /// Runs a checkout for `owner`.
    ///
    /// Fails on an empty cart, a failed cart read, a refused or failed
    /// charge, or a failed write. Once the order is written the checkout
    /// succeeds, whether or not the broadcast and the cart clear do.
    #[tracing::instrument(skip(self, owner, credential), fields(%owner))]
    pub async fn checkout(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        metrics::counter!("checkout_requests_total").increment(1);
        let started = Instant::now();
        let mut progress = Progress::start();

        let result = self.run(owner, credential, &mut progress).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(outcome) => {
                metrics::counter!("checkout_completed_total").increment(1);
                tracing::info!(
                    order_id = %outcome.order.id,
                    event_published = outcome.event_published,
                    cart_cleared = outcome.cart_cleared,
                    "checkout completed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_rejected_total", "reason" => e.reason()).increment(1);
                if e.class() == ErrorClass::ClientInput {
                    tracing::info!(error = %e, "checkout rejected");
                } else {
                    tracing::warn!(error = %e, trace = ?progress.visited(), "checkout failed");
                }
            }
        }
        result
    }

    async fn run(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
        progress: &mut Progress,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // 1. Read the cart
        let fetched = self
            .bounded(self.deps.cart.fetch_cart(owner, credential), |after| {
                CheckoutError::CartUnavailable(CheckoutError::timed_out("cart service", after))
            })
            .await;
        let lines = progress.fatal(fetched)?;
        if lines.is_empty() {
            return Err(progress.reject_empty_cart());
        }
        let amount = progress.fatal(
            Money::checked_sum(lines.iter().map(|line| line.line_total))
                .ok_or_else(|| CheckoutError::CartDecode("cart total is out of range".into())),
        )?;

        // 2. Charge
        progress.advance();
        let charged = self
            .bounded(self.deps.payment.charge(owner, amount), |after| {
                CheckoutError::PaymentUnavailable(CheckoutError::timed_out("payment service", after))
            })
            .await;
        if !progress.fatal(charged)? {
            return progress.fatal(Err(CheckoutError::PaymentDeclined));
        }

        // 3. Persist; last point at which the checkout can abort
        progress.advance();
        let created = self
            .bounded(
                async {
                    self.deps
                        .orders
                        .create_order(owner, lines)
                        .await
                        .map_err(CheckoutError::from)
                },
                |after| {
                    CheckoutError::Persistence(OrderStoreError::Unavailable(
                        CheckoutError::timed_out("order store", after),
                    ))
                },
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create order"));
        let order = progress.fatal(created)?;

        // 4. Broadcast (best effort)
        progress.advance();
        let event = OrderCreatedEvent::new(&order);
        let published = self
            .bounded(
                async {
                    self.deps
                        .events
                        .publish_order_created(&event)
                        .await
                        .map_err(CheckoutError::from)
                },
                |after| CheckoutError::Publish(PublishError::Timeout(after)),
            )
            .await;
        let event_published = progress.best_effort(published, &order);

        // 5. Clear the cart (best effort)
        progress.advance();
        let cleared = self
            .bounded(self.deps.cart.clear_cart(owner, credential), |after| {
                CheckoutError::ClearCart(CheckoutError::timed_out("cart service", after))
            })
            .await;
        let cart_cleared = progress.best_effort(cleared, &order);

        progress.advance();
        Ok(CheckoutOutcome {
            order,
            trace: progress.finish(),
            event_published,
            cart_cleared,
        })
    }

    /// Awaits `call`, turning an elapsed timeout into `on_timeout`.
    async fn bounded<T, F>(
        &self,
        call: F,
        on_timeout: impl FnOnce(Duration) -> CheckoutError,
    ) -> Result<T, CheckoutError>
    where
        F: Future<Output = Result<T, CheckoutError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(self.call_timeout)),
        }
    }
}

/// Position of one checkout in the step sequence.
///
/// Every transition goes through [`CheckoutState::next`]; whether a failed
/// step aborts the checkout is decided by [`CheckoutState::can_abort`].
struct Progress {
    current: CheckoutState,
    visited: Vec<CheckoutState>,
}

impl Progress {
    fn start() -> Self {
        let mut visited = Vec::with_capacity(6);
        visited.push(CheckoutState::ReadingCart);
        Self {
            current: CheckoutState::ReadingCart,
            visited,
        }
    }

    fn enter(&mut self, state: CheckoutState) {
        self.current = state;
        self.visited.push(state);
    }

    /// Moves on to the next step.
    fn advance(&mut self) {
        if let Some(next) = self.current.next() {
            self.enter(next);
        }
    }

    /// Passes `result` through, entering `Failed` on error.
    fn fatal<T>(&mut self, result: Result<T, CheckoutError>) -> Result<T, CheckoutError> {
        if result.is_err() {
            debug_assert!(self.current.can_abort(), "{} cannot abort", self.current);
            self.enter(CheckoutState::Failed);
        }
        result
    }

    fn reject_empty_cart(&mut self) -> CheckoutError {
        self.enter(CheckoutState::RejectedEmptyCart);
        CheckoutError::EmptyCart
    }

    /// Settles a step that runs after the order exists.
    ///
    /// A failure is logged as critical and counted; it never aborts.
    fn best_effort<T>(&self, result: Result<T, CheckoutError>, order: &Order) -> bool {
        let Err(e) = result else {
            return true;
        };
        debug_assert!(!self.current.can_abort(), "{} must abort", self.current);
        metrics::counter!("checkout_best_effort_failures_total", "step" => e.reason())
            .increment(1);
        tracing::error!(
            severity = "critical",
            step = %self.current,
            order_id = %order.id,
            error = %e,
            "order created but a follow-up step failed"
        );
        false
    }

    fn visited(&self) -> &[CheckoutState] {
        &self.visited
    }

    fn finish(&self) -> Vec<CheckoutState> {
        debug_assert!(self.current.is_terminal(), "{} is not terminal", self.current);
        self.visited.clone()
    }
}
