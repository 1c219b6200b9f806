//! Payment seam.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::VerifiedIdentity;
use domain::Money;

use crate::error::CheckoutError;

/// Trait for charging a customer.
///
/// `Ok(false)` means the charge was declined; `Err` means it could not be
/// attempted. Both abort the checkout.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges `owner` for `amount`.
    async fn charge(&self, owner: &VerifiedIdentity, amount: Money) -> Result<bool, CheckoutError>;
}

/// Payment stub that approves every charge.
///
/// Stands in for a real payment collaborator behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct StubPaymentService {
    charges: Arc<AtomicU64>,
}

impl StubPaymentService {
    /// Creates a new stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many charges have been approved.
    pub fn charge_count(&self) -> u64 {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentService for StubPaymentService {
    async fn charge(&self, owner: &VerifiedIdentity, amount: Money) -> Result<bool, CheckoutError> {
        tracing::info!(%owner, %amount, "processing payment");
        self.charges.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
