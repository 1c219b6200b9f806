//! Cart collaborator: reading and clearing a user's cart.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Credential, VerifiedIdentity};
use domain::CartLine;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use tokio::sync::RwLock;

use crate::error::CheckoutError;

/// Trait for the cart collaborator.
///
/// Both calls forward the caller's credential unchanged; the cart service
/// authenticates the user on its own.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the cart's lines in the order the cart reports them.
    async fn fetch_cart(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<Vec<CartLine>, CheckoutError>;

    /// Deletes every line from the cart.
    async fn clear_cart(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<(), CheckoutError>;
}

/// HTTP client for the cart service.
///
/// `GET {cart_url}` must answer `200` with a JSON array of lines and
/// `DELETE {cart_url}` must answer `204`.
#[derive(Debug, Clone)]
pub struct HttpCartClient {
    http: reqwest::Client,
    cart_url: String,
}

impl HttpCartClient {
    /// Builds a client whose every request gives up after `timeout`.
    pub fn new(cart_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, cart_url))
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(http: reqwest::Client, cart_url: impl Into<String>) -> Self {
        Self {
            http,
            cart_url: cart_url.into(),
        }
    }

    /// Returns the cart endpoint this client talks to.
    pub fn cart_url(&self) -> &str {
        &self.cart_url
    }
}

#[async_trait]
impl CartService for HttpCartClient {
    #[tracing::instrument(skip(self, owner, credential), fields(%owner))]
    async fn fetch_cart(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<Vec<CartLine>, CheckoutError> {
        let response = self
            .http
            .get(&self.cart_url)
            .header(AUTHORIZATION, credential.header_value())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to call cart service");
                CheckoutError::CartUnavailable(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "cart service returned non-200 status");
            return Err(CheckoutError::CartRejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CheckoutError::CartUnavailable(e.to_string()))?;

        // An absent cart may come back as `null`.
        let lines: Option<Vec<CartLine>> = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "failed to decode cart response");
            CheckoutError::CartDecode(e.to_string())
        })?;
        Ok(lines.unwrap_or_default())
    }

    #[tracing::instrument(skip(self, owner, credential), fields(%owner))]
    async fn clear_cart(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<(), CheckoutError> {
        let response = self
            .http
            .delete(&self.cart_url)
            .header(AUTHORIZATION, credential.header_value())
            .send()
            .await
            .map_err(|e| CheckoutError::ClearCart(format!("failed to call cart service: {e}")))?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            return Err(CheckoutError::ClearCart(format!(
                "cart service returned non-204 status: {}",
                status.as_u16()
            )));
        }

        tracing::info!("cart cleared");
        Ok(())
    }
}

/// A failure the in-memory cart can be told to produce on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartFailure {
    /// The call never completes.
    Unavailable,
    /// The call completes with this status.
    Status(u16),
    /// The body cannot be decoded.
    Malformed,
}

impl From<CartFailure> for CheckoutError {
    fn from(failure: CartFailure) -> Self {
        match failure {
            CartFailure::Unavailable => {
                CheckoutError::CartUnavailable("connection refused".to_string())
            }
            CartFailure::Status(status) => CheckoutError::CartRejected { status },
            CartFailure::Malformed => CheckoutError::CartDecode("expected an array".to_string()),
        }
    }
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    carts: Arc<RwLock<HashMap<VerifiedIdentity, Vec<CartLine>>>>,
    fetch_failure: Arc<RwLock<Option<CartFailure>>>,
    credentials_seen: Arc<RwLock<Vec<String>>>,
    fail_on_clear: Arc<AtomicBool>,
    clears: Arc<AtomicU64>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service with no carts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the owner's cart.
    pub async fn set_cart(&self, owner: &VerifiedIdentity, lines: Vec<CartLine>) {
        self.carts.write().await.insert(owner.clone(), lines);
    }

    /// Returns the owner's current lines.
    pub async fn lines(&self, owner: &VerifiedIdentity) -> Vec<CartLine> {
        self.carts
            .read()
            .await
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes reads fail with `failure`, or succeed again with `None`.
    pub async fn set_fetch_failure(&self, failure: Option<CartFailure>) {
        *self.fetch_failure.write().await = failure;
    }

    /// Configures the service to fail on clear.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.fail_on_clear.store(fail, Ordering::SeqCst);
    }

    /// Returns how many clear calls were made, successful or not.
    pub fn clear_count(&self) -> u64 {
        self.clears.load(Ordering::SeqCst)
    }

    /// Returns every credential header value received, in call order.
    pub async fn credentials_seen(&self) -> Vec<String> {
        self.credentials_seen.read().await.clone()
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn fetch_cart(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<Vec<CartLine>, CheckoutError> {
        self.credentials_seen
            .write()
            .await
            .push(credential.header_value().to_string());

        if let Some(failure) = *self.fetch_failure.read().await {
            return Err(failure.into());
        }
        Ok(self.lines(owner).await)
    }

    async fn clear_cart(
        &self,
        owner: &VerifiedIdentity,
        credential: &Credential,
    ) -> Result<(), CheckoutError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.credentials_seen
            .write()
            .await
            .push(credential.header_value().to_string());

        if self.fail_on_clear.load(Ordering::SeqCst) {
            return Err(CheckoutError::ClearCart(
                "cart service returned non-204 status: 500".to_string(),
            ));
        }
        self.carts.write().await.remove(owner);
        Ok(())
    }
}
