use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::StoreError;
use crate::domain::{Role, SubscriptionStatus};
use crate::entities::users;
use crate::models::user::{BillingProfile, NewUser, SubscriptionRecord, User, WatchEntry};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let subscription = match (
            model.subscription_id,
            model.subscription_status.as_deref(),
            model.subscription_period_end.as_deref(),
        ) {
            (Some(subscription_id), Some(status), Some(period_end)) => {
                let status = status.parse::<SubscriptionStatus>().ok();
                let period_end = DateTime::parse_from_rfc3339(period_end)
                    .ok()
                    .map(|d| d.with_timezone(&Utc));
                status.zip(period_end).map(|(status, current_period_end)| {
                    SubscriptionRecord {
                        subscription_id,
                        plan_id: model.subscription_plan_id,
                        status,
                        current_period_end,
                    }
                })
            }
            _ => None,
        };

        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            google_id: model.google_id,
            has_password: model.password_hash.is_some(),
            role: model.role.parse().unwrap_or_default(),
            favorites: serde_json::from_str(&model.favorites).unwrap_or_default(),
            watch_history: serde_json::from_str(&model.watch_history).unwrap_or_default(),
            billing: BillingProfile {
                customer_id: model.stripe_customer_id,
                subscription,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_one(
        &self,
        filter: impl sea_orm::sea_query::IntoCondition,
        what: &'static str,
    ) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(filter)
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to query user by {what}"))?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Emails are stored lowercased, so the lookup is normalized the same way.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        self.find_one(users::Column::Email.eq(email), "email").await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one(users::Column::Username.eq(username.trim()), "username")
            .await
    }

    pub async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        self.find_one(users::Column::GoogleId.eq(google_id), "google id")
            .await
    }

    pub async fn get_by_customer_id(&self, customer_id: &str) -> Result<Option<User>> {
        self.find_one(
            users::Column::StripeCustomerId.eq(customer_id),
            "customer id",
        )
        .await
    }

    /// Creates an account. The password, if any, is hashed on a blocking
    /// task with the configured Argon2 parameters.
    pub async fn create(
        &self,
        new_user: &NewUser,
        config: &SecurityConfig,
    ) -> Result<User, StoreError> {
        let password_hash = match &new_user.password {
            Some(password) => Some(hash_password_blocking(password, config).await?),
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        let active = users::ActiveModel {
            username: Set(new_user.username.trim().to_string()),
            email: Set(new_user.email.trim().to_lowercase()),
            password_hash: Set(password_hash),
            google_id: Set(new_user.google_id.clone()),
            role: Set(Role::default().as_str().to_string()),
            favorites: Set("[]".to_string()),
            watch_history: Set("[]".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(StoreError::from_insert)?;

        Ok(User::from(model))
    }

    /// Persists the mutable parts of a loaded user: username, role, library
    /// lists and billing profile. Credentials are changed through
    /// [`Self::set_password`].
    pub async fn save(&self, user: &User) -> Result<User, StoreError> {
        let model = users::Entity::find_by_id(user.id)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        let subscription = user.billing.subscription.as_ref();

        let mut active: users::ActiveModel = model.into();
        active.username = Set(user.username.trim().to_string());
        active.google_id = Set(user.google_id.clone());
        active.role = Set(user.role.as_str().to_string());
        active.favorites = Set(serde_json::to_string(&user.favorites)
            .context("Failed to encode favorites")?);
        active.watch_history = Set(serde_json::to_string(&user.watch_history)
            .context("Failed to encode watch history")?);
        active.stripe_customer_id = Set(user.billing.customer_id.clone());
        active.subscription_id = Set(subscription.map(|s| s.subscription_id.clone()));
        active.subscription_plan_id = Set(subscription.and_then(|s| s.plan_id.clone()));
        active.subscription_status = Set(subscription.map(|s| s.status.as_str().to_string()));
        active.subscription_period_end =
            Set(subscription.map(|s| s.current_period_end.to_rfc3339()));
        active.updated_at = Set(Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .map_err(StoreError::from_insert)?;

        Ok(User::from(model))
    }

    /// Checks a password against the stored hash.
    ///
    /// Accounts without a password (Google-only) never verify.
    pub async fn verify_password(&self, user_id: i32, password: &str) -> Result<bool> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(password_hash) = user.and_then(|u| u.password_hash) else {
            return Ok(false);
        };

        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn set_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let new_hash = hash_password_blocking(new_password, config).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(new_hash));
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Sets the role of the account with the given email. Returns `false`
    /// when no such account exists.
    pub async fn set_role(&self, email: &str, role: Role) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user for role update")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role.as_str().to_string());
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}

async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
