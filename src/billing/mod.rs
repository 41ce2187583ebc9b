//! Subscription billing: the payment-processor seam, webhook signatures and
//! reconciliation of processor state into the local billing profile.

pub mod reconcile;
pub mod signature;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SubscriptionStatus;

pub use reconcile::reconcile;

#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor answered with an error payload.
    #[error("Payment provider error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Failed to parse processor payload: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSubscription {
    pub subscription_id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    /// Client secret of the first invoice's payment intent, used by the
    /// frontend to collect payment.
    pub client_secret: Option<String>,
}

/// Subscription snapshot as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSubscription {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    /// Creation time, Unix seconds.
    pub created: Option<i64>,
    /// End of the current billing period, Unix seconds.
    pub current_period_end: Option<i64>,
    pub latest_invoice: Option<String>,
    pub plan_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: String,
    pub paid: bool,
    pub payment_intent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub amount: i64,
    pub client_secret: Option<String>,
}

/// Verified webhook events the service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `customer.subscription.created`, `.updated` or `.deleted`.
    SubscriptionChanged {
        event_type: String,
        subscription: ProcessorSubscription,
    },
    /// `payment_intent.succeeded`.
    PaymentSucceeded { id: String, amount: i64 },
    /// Anything else; acknowledged and ignored.
    Other { event_type: String },
}

/// Operations the service needs from the payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a processor customer and returns its id.
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, PaymentError>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<CreatedSubscription, PaymentError>;

    async fn retrieve_subscription(&self, id: &str)
    -> Result<ProcessorSubscription, PaymentError>;

    async fn retrieve_invoice(&self, id: &str) -> Result<Invoice, PaymentError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Verifies the signature header over the raw body and parses the event.
    fn construct_event(&self, payload: &[u8], signature: &str)
    -> Result<WebhookEvent, PaymentError>;
}
