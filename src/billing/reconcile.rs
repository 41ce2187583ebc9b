//! Merging processor subscription state into the locally stored record.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::{debug, warn};

use super::{PaymentIntentStatus, PaymentProcessor, ProcessorSubscription};
use crate::domain::SubscriptionStatus;
use crate::models::user::SubscriptionRecord;

/// Age after which an incomplete subscription's payment intent is checked.
pub const INCOMPLETE_GRACE_SECS: i64 = 60;

/// Period length assumed when the processor reports none.
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Computes the subscription record to store for `sub`.
///
/// An `incomplete` subscription is promoted to `active` when its latest
/// invoice is paid, or, once it is older than [`INCOMPLETE_GRACE_SECS`], when
/// that invoice's payment intent has succeeded. Lookup failures are logged
/// and leave the processor status in place.
///
/// The period end comes from the processor, else from `previous` when it
/// describes the same subscription, else `now` plus [`DEFAULT_PERIOD_DAYS`].
pub async fn reconcile(
    processor: &dyn PaymentProcessor,
    sub: &ProcessorSubscription,
    previous: Option<&SubscriptionRecord>,
    now: DateTime<Utc>,
) -> SubscriptionRecord {
    let status = effective_status(processor, sub, now).await;

    let current_period_end = sub
        .current_period_end
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .or_else(|| {
            previous
                .filter(|p| p.subscription_id == sub.id)
                .map(|p| p.current_period_end)
        })
        .unwrap_or_else(|| now + Duration::days(DEFAULT_PERIOD_DAYS));

    SubscriptionRecord {
        subscription_id: sub.id.clone(),
        plan_id: sub.plan_id.clone(),
        status,
        current_period_end,
    }
}

async fn effective_status(
    processor: &dyn PaymentProcessor,
    sub: &ProcessorSubscription,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    if sub.status != SubscriptionStatus::Incomplete {
        return sub.status;
    }
    let Some(invoice_id) = sub.latest_invoice.as_deref() else {
        return sub.status;
    };

    let invoice = match processor.retrieve_invoice(invoice_id).await {
        Ok(invoice) => invoice,
        Err(e) => {
            warn!(subscription = %sub.id, invoice = %invoice_id, error = %e, "Failed to check latest invoice");
            return sub.status;
        }
    };

    if invoice.paid {
        debug!(subscription = %sub.id, "Latest invoice paid, treating subscription as active");
        return SubscriptionStatus::Active;
    }

    let old_enough = sub
        .created
        .is_some_and(|created| now.timestamp() - created > INCOMPLETE_GRACE_SECS);
    if !old_enough {
        return sub.status;
    }
    let Some(intent_id) = invoice.payment_intent.as_deref() else {
        return sub.status;
    };

    match processor.retrieve_payment_intent(intent_id).await {
        Ok(intent) if intent.status == PaymentIntentStatus::Succeeded => {
            debug!(subscription = %sub.id, "Payment intent succeeded, treating subscription as active");
            SubscriptionStatus::Active
        }
        Ok(_) => sub.status,
        Err(e) => {
            warn!(subscription = %sub.id, payment_intent = %intent_id, error = %e, "Failed to check payment intent");
            sub.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{
        CreatedSubscription, Invoice, PaymentError, PaymentIntent, WebhookEvent,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProcessor {
        invoice_paid: bool,
        invoice_fails: bool,
        intent_status: Option<PaymentIntentStatus>,
        intent_lookups: AtomicUsize,
    }

    #[async_trait]
    impl PaymentProcessor for FakeProcessor {
        async fn create_customer(&self, _: &str, _: &str) -> Result<String, PaymentError> {
            unreachable!()
        }

        async fn create_subscription(
            &self,
            _: &str,
            _: &str,
        ) -> Result<CreatedSubscription, PaymentError> {
            unreachable!()
        }

        async fn retrieve_subscription(
            &self,
            _: &str,
        ) -> Result<ProcessorSubscription, PaymentError> {
            unreachable!()
        }

        async fn retrieve_invoice(&self, id: &str) -> Result<Invoice, PaymentError> {
            if self.invoice_fails {
                return Err(PaymentError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(Invoice {
                id: id.to_string(),
                paid: self.invoice_paid,
                payment_intent: Some("pi_1".to_string()),
            })
        }

        async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
            self.intent_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(PaymentIntent {
                id: id.to_string(),
                status: self
                    .intent_status
                    .unwrap_or(PaymentIntentStatus::RequiresPaymentMethod),
                amount: 999,
                client_secret: None,
            })
        }

        fn construct_event(&self, _: &[u8], _: &str) -> Result<WebhookEvent, PaymentError> {
            unreachable!()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn sub(status: SubscriptionStatus, age_secs: i64) -> ProcessorSubscription {
        ProcessorSubscription {
            id: "sub_1".to_string(),
            customer: "cus_1".to_string(),
            status,
            created: Some(now().timestamp() - age_secs),
            current_period_end: None,
            latest_invoice: Some("in_1".to_string()),
            plan_id: Some("price_basic".to_string()),
        }
    }

    #[tokio::test]
    async fn test_paid_invoice_activates_incomplete() {
        let processor = FakeProcessor {
            invoice_paid: true,
            ..Default::default()
        };
        let record = reconcile(&processor, &sub(SubscriptionStatus::Incomplete, 5), None, now()).await;
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.plan_id.as_deref(), Some("price_basic"));
    }

    #[tokio::test]
    async fn test_young_incomplete_skips_payment_intent() {
        let processor = FakeProcessor {
            intent_status: Some(PaymentIntentStatus::Succeeded),
            ..Default::default()
        };
        let record = reconcile(&processor, &sub(SubscriptionStatus::Incomplete, 30), None, now()).await;
        assert_eq!(record.status, SubscriptionStatus::Incomplete);
        assert_eq!(processor.intent_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_old_incomplete_with_succeeded_intent_activates() {
        let processor = FakeProcessor {
            intent_status: Some(PaymentIntentStatus::Succeeded),
            ..Default::default()
        };
        let record = reconcile(&processor, &sub(SubscriptionStatus::Incomplete, 61), None, now()).await;
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(processor.intent_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_keeps_status() {
        let processor = FakeProcessor {
            invoice_fails: true,
            ..Default::default()
        };
        let record = reconcile(&processor, &sub(SubscriptionStatus::Incomplete, 600), None, now()).await;
        assert_eq!(record.status, SubscriptionStatus::Incomplete);
    }

    #[tokio::test]
    async fn test_other_statuses_pass_through() {
        let processor = FakeProcessor {
            invoice_paid: true,
            ..Default::default()
        };
        let record = reconcile(&processor, &sub(SubscriptionStatus::PastDue, 600), None, now()).await;
        assert_eq!(record.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn test_period_end_sources() {
        let processor = FakeProcessor::default();
        let mut s = sub(SubscriptionStatus::Active, 600);

        let record = reconcile(&processor, &s, None, now()).await;
        assert_eq!(record.current_period_end, now() + Duration::days(30));

        let stored = SubscriptionRecord {
            subscription_id: "sub_1".to_string(),
            plan_id: None,
            status: SubscriptionStatus::Active,
            current_period_end: now() + Duration::days(3),
        };
        let record = reconcile(&processor, &s, Some(&stored), now()).await;
        assert_eq!(record.current_period_end, stored.current_period_end);

        let other = SubscriptionRecord {
            subscription_id: "sub_other".to_string(),
            ..stored.clone()
        };
        let record = reconcile(&processor, &s, Some(&other), now()).await;
        assert_eq!(record.current_period_end, now() + Duration::days(30));

        s.current_period_end = Some(1_750_000_000);
        let record = reconcile(&processor, &s, Some(&stored), now()).await;
        assert_eq!(record.current_period_end.timestamp(), 1_750_000_000);
    }

    #[tokio::test]
    async fn test_reconcile_is_stable_for_same_input() {
        let processor = FakeProcessor::default();
        let s = sub(SubscriptionStatus::Active, 600);
        let first = reconcile(&processor, &s, None, now()).await;
        let later = now() + Duration::minutes(5);
        let second = reconcile(&processor, &s, Some(&first), later).await;
        assert_eq!(first, second);
    }
}
