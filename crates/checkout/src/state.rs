//! Checkout state machine.

/// The steps a checkout moves through.
///
/// State transitions:
/// ```text
/// ReadingCart ──► Charging ──► Persisting ──► Publishing ──► ClearingCart ──► Responding
///      │  └──► RejectedEmptyCart  │               │
///      └──────────────────────────┴───────────────┴──► Failed
/// ```
///
/// Publishing and ClearingCart always move on, whatever their outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutState {
    /// Fetching the caller's cart.
    ReadingCart,
    /// Charging the caller.
    Charging,
    /// Writing the order.
    Persisting,
    /// Broadcasting `order_created` (best effort).
    Publishing,
    /// Emptying the cart (best effort).
    ClearingCart,
    /// Returning the persisted order (terminal state).
    Responding,
    /// The cart was empty (terminal state).
    RejectedEmptyCart,
    /// A fatal step failed (terminal state).
    Failed,
}

impl CheckoutState {
    /// Returns true if a failure in this step aborts the checkout.
    pub fn can_abort(&self) -> bool {
        matches!(
            self,
            CheckoutState::ReadingCart | CheckoutState::Charging | CheckoutState::Persisting
        )
    }

    /// The state entered when this step completes, successfully or not
    /// for best-effort steps.
    pub fn next(&self) -> Option<CheckoutState> {
        match self {
            CheckoutState::ReadingCart => Some(CheckoutState::Charging),
            CheckoutState::Charging => Some(CheckoutState::Persisting),
            CheckoutState::Persisting => Some(CheckoutState::Publishing),
            CheckoutState::Publishing => Some(CheckoutState::ClearingCart),
            CheckoutState::ClearingCart => Some(CheckoutState::Responding),
            CheckoutState::Responding
            | CheckoutState::RejectedEmptyCart
            | CheckoutState::Failed => None,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::ReadingCart => "ReadingCart",
            CheckoutState::Charging => "Charging",
            CheckoutState::Persisting => "Persisting",
            CheckoutState::Publishing => "Publishing",
            CheckoutState::ClearingCart => "ClearingCart",
            CheckoutState::Responding => "Responding",
            CheckoutState::RejectedEmptyCart => "RejectedEmptyCart",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
