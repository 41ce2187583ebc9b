use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::{
    CheckoutResponse, ConfirmResponse, ConfirmSubscriptionRequest, CreateSubscriptionRequest,
    StatusResponse, SubscriptionDto, WebhookAck,
};
use super::validation::required;
use super::{ApiError, ApiJson, AppState};
use crate::constants::headers::STRIPE_SIGNATURE;
use crate::domain::SubscriptionStatus;
use crate::services::BillingError;

fn billing_error(state: &AppState, err: BillingError) -> ApiError {
    ApiError::from_billing(err, !state.shared.config.general.is_production())
}

/// POST /payments/create-subscription
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateSubscriptionRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let checkout = state
        .shared
        .billing_service
        .create_subscription(user.id, payload.price_id.as_deref())
        .await
        .map_err(|e| billing_error(&state, e))?;

    Ok(Json(CheckoutResponse {
        success: true,
        client_secret: checkout.client_secret,
        subscription_id: checkout.subscription_id,
        customer_id: checkout.customer_id,
    }))
}

/// POST /payments/confirm-subscription
pub async fn confirm_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<ConfirmSubscriptionRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let subscription_id = required(payload.subscription_id.as_deref(), "subscriptionId")?;

    let record = state
        .shared
        .billing_service
        .confirm_subscription(user.id, subscription_id)
        .await
        .map_err(|e| billing_error(&state, e))?;

    Ok(Json(ConfirmResponse {
        success: true,
        subscription: SubscriptionDto::from(record),
    }))
}

/// GET /payments/subscription-status
pub async fn subscription_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = state
        .shared
        .billing_service
        .subscription_status(user.id)
        .await
        .map_err(|e| billing_error(&state, e))?;

    let response = match record {
        Some(record) => StatusResponse {
            success: true,
            status: record.status.to_string(),
            subscription: Some(SubscriptionDto::from(record)),
        },
        None => StatusResponse {
            success: true,
            status: SubscriptionStatus::Inactive.to_string(),
            subscription: None,
        },
    };

    Ok(Json(response))
}

/// POST /payments/webhook
///
/// Takes the raw body; the signature covers the exact bytes sent.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::validation("INVALID_SIGNATURE", "Webhook Error: missing signature header")
        })?;

    let outcome = state
        .shared
        .billing_service
        .handle_webhook(&body, signature)
        .await
        .map_err(|e| billing_error(&state, e))?;

    metrics::counter!("payment_webhooks_total", "outcome" => outcome.as_str()).increment(1);
    tracing::debug!(outcome = outcome.as_str(), "Webhook handled");
    Ok(Json(WebhookAck {
        success: true,
        received: true,
    }))
}
