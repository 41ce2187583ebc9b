//! Domain service for subscriptions and processor webhooks.

use thiserror::Error;

use crate::billing::PaymentError;
use crate::models::user::SubscriptionRecord;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("User not found")]
    UserNotFound,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Subscription does not belong to this account")]
    SubscriptionMismatch,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Payment provider error: {0}")]
    Payment(PaymentError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature(reason) => Self::InvalidSignature(reason),
            other => Self::Payment(other),
        }
    }
}

impl From<sea_orm::DbErr> for BillingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BillingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<crate::db::StoreError> for BillingError {
    fn from(err: crate::db::StoreError) -> Self {
        match err {
            crate::db::StoreError::NotFound => Self::UserNotFound,
            other => Self::Database(other.to_string()),
        }
    }
}

/// What the client needs to collect the first payment.
#[derive(Debug, Clone)]
pub struct SubscriptionCheckout {
    pub client_secret: Option<String>,
    pub subscription_id: String,
    pub customer_id: String,
}

/// Result of handling a verified webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A stored subscription changed.
    Updated,
    /// The event carried the state already stored.
    Unchanged,
    /// No local account matches the event's customer.
    UnknownCustomer,
    /// Acknowledged without any local effect.
    Ignored,
}

impl WebhookOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::UnknownCustomer => "unknown_customer",
            Self::Ignored => "ignored",
        }
    }
}

#[async_trait::async_trait]
pub trait BillingService: Send + Sync {
    /// Creates the processor customer on first use, then an incomplete
    /// subscription for `price_id` (or the configured default price).
    async fn create_subscription(
        &self,
        user_id: i32,
        price_id: Option<&str>,
    ) -> Result<SubscriptionCheckout, BillingError>;

    /// Pulls the subscription from the processor, reconciles and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::SubscriptionMismatch`] when the subscription
    /// belongs to another customer.
    async fn confirm_subscription(
        &self,
        user_id: i32,
        subscription_id: &str,
    ) -> Result<SubscriptionRecord, BillingError>;

    /// The stored subscription, if any.
    async fn subscription_status(
        &self,
        user_id: i32,
    ) -> Result<Option<SubscriptionRecord>, BillingError>;

    /// Verifies and applies a processor webhook.
    async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, BillingError>;
}
