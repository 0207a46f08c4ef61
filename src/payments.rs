//! External card payment provider.
//!
//! No provider ships with the server yet; `AppState::payments` is `None`
//! and every deferred-payment route answers "provider unavailable".

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{error::AppError, models::Order};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("webhook signature rejected")]
    InvalidSignature,

    #[error("payment provider error: {0}")]
    Provider(String),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => AppError::unauthorized(),
            PaymentError::Provider(detail) => {
                tracing::error!(error = %detail, "payment provider call failed");
                AppError::ProviderUnavailable("Payment provider is unavailable.".into())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Payment for this order settled.
    Paid { order_id: Uuid },
    /// Anything the store does not act on.
    Ignored,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open a hosted checkout for an already persisted, unpaid order.
    async fn start_checkout(
        &self,
        order: &Order,
        currency: &str,
        return_origin: &str,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Ask the provider whether the session for `order_id` has been paid.
    async fn is_paid(&self, order_id: Uuid, session_id: &str) -> Result<bool, PaymentError>;

    /// Check the signature over the raw body and decode the event.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent, PaymentError>;
}
