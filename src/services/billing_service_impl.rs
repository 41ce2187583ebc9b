//! `SeaORM` implementation of the `BillingService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::billing::{self, PaymentProcessor, WebhookEvent};
use crate::db::Store;
use crate::models::user::{SubscriptionRecord, User};
use crate::services::billing_service::{
    BillingError, BillingService, SubscriptionCheckout, WebhookOutcome,
};

pub struct SeaOrmBillingService {
    store: Store,
    processor: Arc<dyn PaymentProcessor>,
    default_price_id: Option<String>,
}

impl SeaOrmBillingService {
    #[must_use]
    pub fn new(
        store: Store,
        processor: Arc<dyn PaymentProcessor>,
        default_price_id: Option<String>,
    ) -> Self {
        Self {
            store,
            processor,
            default_price_id,
        }
    }

    async fn load(&self, user_id: i32) -> Result<User, BillingError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(BillingError::UserNotFound)
    }

    async fn customer_id(&self, user: &mut User) -> Result<String, BillingError> {
        if let Some(id) = user.billing.customer_id.clone() {
            return Ok(id);
        }

        let id = self
            .processor
            .create_customer(&user.email, &user.username)
            .await?;
        user.billing.customer_id = Some(id.clone());
        *user = self.store.save_user(user).await?;

        info!(user_id = user.id, customer_id = %id, "Created payment customer");
        Ok(id)
    }
}

#[async_trait]
impl BillingService for SeaOrmBillingService {
    async fn create_subscription(
        &self,
        user_id: i32,
        price_id: Option<&str>,
    ) -> Result<SubscriptionCheckout, BillingError> {
        let price_id = price_id
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or(self.default_price_id.as_deref())
            .ok_or(BillingError::MissingField("priceId"))?
            .to_string();

        let mut user = self.load(user_id).await?;
        let customer_id = self.customer_id(&mut user).await?;

        let created = self
            .processor
            .create_subscription(&customer_id, &price_id)
            .await?;

        info!(
            user_id,
            subscription_id = %created.subscription_id,
            status = %created.status,
            "Created subscription"
        );

        Ok(SubscriptionCheckout {
            client_secret: created.client_secret,
            subscription_id: created.subscription_id,
            customer_id: created.customer_id,
        })
    }

    async fn confirm_subscription(
        &self,
        user_id: i32,
        subscription_id: &str,
    ) -> Result<SubscriptionRecord, BillingError> {
        let mut user = self.load(user_id).await?;
        let sub = self.processor.retrieve_subscription(subscription_id).await?;

        if user.billing.customer_id.as_deref() != Some(sub.customer.as_str()) {
            warn!(user_id, subscription_id, "Subscription belongs to another customer");
            return Err(BillingError::SubscriptionMismatch);
        }

        let record = billing::reconcile(
            self.processor.as_ref(),
            &sub,
            user.billing.subscription.as_ref(),
            Utc::now(),
        )
        .await;

        user.billing.subscription = Some(record.clone());
        self.store.save_user(&user).await?;

        info!(user_id, subscription_id, status = %record.status, "Subscription confirmed");
        Ok(record)
    }

    async fn subscription_status(
        &self,
        user_id: i32,
    ) -> Result<Option<SubscriptionRecord>, BillingError> {
        Ok(self.load(user_id).await?.billing.subscription)
    }

    async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, BillingError> {
        let event = self.processor.construct_event(payload, signature)?;

        match event {
            WebhookEvent::SubscriptionChanged {
                event_type,
                subscription,
            } => {
                let Some(mut user) = self
                    .store
                    .get_user_by_customer_id(&subscription.customer)
                    .await?
                else {
                    warn!(customer = %subscription.customer, %event_type, "Webhook for unknown customer");
                    return Ok(WebhookOutcome::UnknownCustomer);
                };

                let record = billing::reconcile(
                    self.processor.as_ref(),
                    &subscription,
                    user.billing.subscription.as_ref(),
                    Utc::now(),
                )
                .await;

                if user.billing.subscription.as_ref() == Some(&record) {
                    info!(user_id = user.id, %event_type, "Subscription already up to date");
                    return Ok(WebhookOutcome::Unchanged);
                }

                info!(
                    user_id = user.id,
                    %event_type,
                    subscription_id = %record.subscription_id,
                    status = %record.status,
                    "Subscription updated from webhook"
                );
                user.billing.subscription = Some(record);
                self.store.save_user(&user).await?;
                Ok(WebhookOutcome::Updated)
            }
            WebhookEvent::PaymentSucceeded { id, amount } => {
                info!(payment_intent = %id, amount, "Payment succeeded");
                Ok(WebhookOutcome::Ignored)
            }
            WebhookEvent::Other { event_type } => {
                info!(%event_type, "Unhandled webhook event");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}
