use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Role, SubscriptionStatus};

/// Account data loaded from the store, without the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub google_id: Option<String>,
    pub has_password: bool,
    pub role: Role,
    pub favorites: Vec<String>,
    pub watch_history: Vec<WatchEntry>,
    pub billing: BillingProfile,
    pub created_at: String,
    pub updated_at: String,
}

/// One watched title. The history is kept most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEntry {
    pub video_id: String,
    pub watched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingProfile {
    pub customer_id: Option<String>,
    pub subscription: Option<SubscriptionRecord>,
}

/// Locally persisted subscription state after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub subscription_id: String,
    pub plan_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: DateTime<Utc>,
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub google_id: Option<String>,
}
