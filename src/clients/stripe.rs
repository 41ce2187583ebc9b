//! Minimal Stripe REST client covering customers, subscriptions, invoices,
//! payment intents and webhook events.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::billing::{
    CreatedSubscription, Invoice, PaymentError, PaymentIntent, PaymentIntentStatus,
    PaymentProcessor, ProcessorSubscription, WebhookEvent, signature,
};
use crate::domain::SubscriptionStatus;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_base: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
}

/// Expandable fields are either an id or the expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T: HasId> Expandable<T> {
    fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(obj) => obj.id(),
        }
    }

    fn object(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Object(obj) => Some(obj),
        }
    }
}

trait HasId {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StripePaymentIntent {
    id: String,
    status: PaymentIntentStatus,
    #[serde(default)]
    amount: i64,
    client_secret: Option<String>,
}

impl HasId for StripePaymentIntent {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StripeInvoice {
    id: String,
    #[serde(default)]
    paid: bool,
    payment_intent: Option<Expandable<StripePaymentIntent>>,
}

impl HasId for StripeInvoice {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StripePrice {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StripeSubscriptionItem {
    price: Option<StripePrice>,
    current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct StripeList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
struct StripeSubscription {
    id: String,
    customer: Expandable<StripeCustomer>,
    status: SubscriptionStatus,
    created: Option<i64>,
    current_period_end: Option<i64>,
    latest_invoice: Option<Expandable<StripeInvoice>>,
    items: Option<StripeList<StripeSubscriptionItem>>,
}

impl HasId for StripeCustomer {
    fn id(&self) -> &str {
        &self.id
    }
}

impl From<StripeSubscription> for ProcessorSubscription {
    fn from(sub: StripeSubscription) -> Self {
        let first_item = sub.items.as_ref().and_then(|items| items.data.first());
        Self {
            customer: sub.customer.id().to_string(),
            latest_invoice: sub.latest_invoice.as_ref().map(|i| i.id().to_string()),
            plan_id: first_item.and_then(|item| item.price.as_ref().map(|p| p.id.clone())),
            // Newer API versions report the period on the item
            current_period_end: sub
                .current_period_end
                .or_else(|| first_item.and_then(|item| item.current_period_end)),
            id: sub.id,
            status: sub.status,
            created: sub.created,
        }
    }
}

impl From<StripeInvoice> for Invoice {
    fn from(invoice: StripeInvoice) -> Self {
        Self {
            payment_intent: invoice.payment_intent.as_ref().map(|p| p.id().to_string()),
            id: invoice.id,
            paid: invoice.paid,
        }
    }
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(intent: StripePaymentIntent) -> Self {
        Self {
            id: intent.id,
            status: intent.status,
            amount: intent.amount,
            client_secret: intent.client_secret,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

/// Parses a (verified) webhook payload into the events the service handles.
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
    let event: StripeEvent = serde_json::from_slice(payload)?;

    match event.event_type.as_str() {
        "customer.subscription.created"
        | "customer.subscription.updated"
        | "customer.subscription.deleted" => {
            let subscription: StripeSubscription = serde_json::from_value(event.data.object)?;
            Ok(WebhookEvent::SubscriptionChanged {
                event_type: event.event_type,
                subscription: subscription.into(),
            })
        }
        "payment_intent.succeeded" => {
            let intent: StripePaymentIntent = serde_json::from_value(event.data.object)?;
            Ok(WebhookEvent::PaymentSucceeded {
                id: intent.id,
                amount: intent.amount,
            })
        }
        _ => Ok(WebhookEvent::Other {
            event_type: event.event_type,
        }),
    }
}

pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    #[must_use]
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("Cinevault/1.0")
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.api_base.trim_end_matches('/'))
    }

    async fn handle<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        Err(PaymentError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.secret_key)
            .query(query)
            .send()
            .await?;

        Self::handle(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        Self::handle(response).await
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, PaymentError> {
        let customer: StripeCustomer = self
            .post("customers", &[("email", email), ("name", name)])
            .await?;

        info!(customer = %customer.id, "Created Stripe customer");
        Ok(customer.id)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<CreatedSubscription, PaymentError> {
        let sub: StripeSubscription = self
            .post(
                "subscriptions",
                &[
                    ("customer", customer_id),
                    ("items[0][price]", price_id),
                    ("payment_behavior", "default_incomplete"),
                    ("payment_settings[save_default_payment_method]", "on_subscription"),
                    ("expand[]", "latest_invoice.payment_intent"),
                ],
            )
            .await?;

        let client_secret = sub
            .latest_invoice
            .as_ref()
            .and_then(Expandable::object)
            .and_then(|invoice| invoice.payment_intent.as_ref())
            .and_then(Expandable::object)
            .and_then(|intent| intent.client_secret.clone());

        info!(subscription = %sub.id, customer = %customer_id, "Created Stripe subscription");

        Ok(CreatedSubscription {
            subscription_id: sub.id,
            customer_id: sub.customer.id().to_string(),
            status: sub.status,
            client_secret,
        })
    }

    async fn retrieve_subscription(
        &self,
        id: &str,
    ) -> Result<ProcessorSubscription, PaymentError> {
        let sub: StripeSubscription = self.get(&format!("subscriptions/{id}"), &[]).await?;
        debug!(subscription = %sub.id, status = %sub.status, "Retrieved Stripe subscription");
        Ok(sub.into())
    }

    async fn retrieve_invoice(&self, id: &str) -> Result<Invoice, PaymentError> {
        let invoice: StripeInvoice = self.get(&format!("invoices/{id}"), &[]).await?;
        Ok(invoice.into())
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let intent: StripePaymentIntent =
            self.get(&format!("payment_intents/{id}"), &[]).await?;
        Ok(intent.into())
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        signature::verify(
            payload,
            signature_header,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
            chrono::Utc::now().timestamp(),
        )?;
        parse_event(payload)
    }
}
