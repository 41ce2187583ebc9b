//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use crate::auth::TokenManager;
use crate::clients::google::GoogleVerifier;
use crate::config::SecurityConfig;
use crate::constants::accounts;
use crate::db::{Store, StoreError};
use crate::models::user::{NewUser, User};
use crate::services::account_service::{AccountError, AccountService, Session};

pub struct SeaOrmAccountService {
    store: Store,
    tokens: Arc<TokenManager>,
    google: Option<Arc<dyn GoogleVerifier>>,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(
        store: Store,
        tokens: Arc<TokenManager>,
        google: Option<Arc<dyn GoogleVerifier>>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            google,
            security,
        }
    }

    fn session(&self, user: User) -> Result<Session, AccountError> {
        let token = self.tokens.issue(user.id)?;
        Ok(Session { token, user })
    }

    async fn load(&self, user_id: i32) -> Result<User, AccountError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    /// Logs in the account a concurrent first sign-in created for `subject`.
    async fn adopt_google_account(&self, subject: &str) -> Result<Session, AccountError> {
        match self.store.get_user_by_google_id(subject).await? {
            Some(user) => {
                info!(user_id = user.id, "Google account created concurrently, logging in");
                self.session(user)
            }
            None => {
                warn!("Google subject reported duplicate but no account holds it");
                Err(AccountError::GoogleAccountConflict)
            }
        }
    }

    /// First free username derived from `base`, adding a random four digit
    /// suffix on collision.
    async fn free_username(&self, base: &str) -> Result<String, AccountError> {
        if self.store.get_user_by_username(base).await?.is_none() {
            return Ok(base.to_string());
        }

        for _ in 0..accounts::USERNAME_SUFFIX_ATTEMPTS {
            let candidate = format!("{base}{}", random_suffix());
            if self.store.get_user_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(AccountError::UsernameTaken)
    }
}

fn random_suffix() -> u16 {
    rand::rng().random_range(1000..10000)
}

/// Username seed from a Google display name: whitespace removed, lowercased.
fn username_from_display_name(name: &str, email: &str) -> String {
    let base: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    let base = if base.is_empty() {
        email.split('@').next().unwrap_or_default().to_lowercase()
    } else {
        base
    };

    if base.chars().count() < accounts::MIN_USERNAME_LEN {
        format!("{base}user")
    } else {
        base
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AccountError> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }

        let user = self
            .store
            .create_user(
                &NewUser {
                    username: username.to_string(),
                    email,
                    password: Some(password.to_string()),
                    google_id: None,
                },
                &self.security,
            )
            .await?;

        info!(user_id = user.id, username = %user.username, "Account created");
        self.session(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.store.get_user_by_email(&email).await? else {
            return Err(AccountError::InvalidCredentials);
        };

        if !self.store.verify_user_password(user.id, password).await? {
            warn!(user_id = user.id, "Failed login attempt");
            return Err(AccountError::InvalidCredentials);
        }

        info!(user_id = user.id, "User logged in");
        self.session(user)
    }

    async fn google_login(&self, id_token: &str) -> Result<Session, AccountError> {
        let verifier = self.google.as_ref().ok_or(AccountError::GoogleDisabled)?;
        let identity = verifier
            .verify_id_token(id_token)
            .await
            .map_err(|e| AccountError::GoogleRejected(e.to_string()))?;

        if let Some(user) = self.store.get_user_by_google_id(&identity.subject).await? {
            info!(user_id = user.id, "User logged in with Google");
            return self.session(user);
        }

        let subject = identity.subject;
        let email = identity.email.trim().to_lowercase();
        if let Some(existing) = self.store.get_user_by_email(&email).await? {
            if existing.has_password {
                return Err(AccountError::EmailRegisteredWithPassword);
            }

            // Account created through Google under a different subject
            let mut linked = existing;
            linked.google_id = Some(subject);
            let linked = self.store.save_user(&linked).await?;
            return self.session(linked);
        }

        let username = self
            .free_username(&username_from_display_name(&identity.name, &email))
            .await?;

        let created = self
            .store
            .create_user(
                &NewUser {
                    username,
                    email,
                    password: None,
                    google_id: Some(subject.clone()),
                },
                &self.security,
            )
            .await;

        let user = match created {
            Ok(user) => user,
            Err(StoreError::Duplicate(column)) if column == "google_id" => {
                return self.adopt_google_account(&subject).await;
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, username = %user.username, "Account created with Google");
        self.session(user)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current: Option<&str>,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let user = self.load(user_id).await?;

        if user.has_password {
            let Some(current) = current.filter(|c| !c.is_empty()) else {
                return Err(AccountError::Validation {
                    code: "MISSING_FIELDS",
                    message: "Current password is required".to_string(),
                });
            };
            if !self.store.verify_user_password(user_id, current).await? {
                return Err(AccountError::InvalidCredentials);
            }
        }

        self.store
            .set_user_password(user_id, new_password, &self.security)
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    async fn me(&self, user_id: i32) -> Result<User, AccountError> {
        self.load(user_id).await
    }

    async fn update_username(&self, user_id: i32, username: &str) -> Result<User, AccountError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccountError::Validation {
                code: "MISSING_FIELDS",
                message: "Username is required".to_string(),
            });
        }
        if username.chars().count() < accounts::MIN_USERNAME_LEN {
            return Err(AccountError::Validation {
                code: "INVALID_USERNAME",
                message: format!(
                    "Username must be at least {} characters",
                    accounts::MIN_USERNAME_LEN
                ),
            });
        }

        let mut user = self.load(user_id).await?;
        if user.username == username {
            return Err(AccountError::Validation {
                code: "SAME_USERNAME",
                message: "New username must be different from the current one".to_string(),
            });
        }
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }

        let old = std::mem::replace(&mut user.username, username.to_string());
        let user = self.store.save_user(&user).await?;
        info!(user_id, from = %old, to = %user.username, "Username changed");
        Ok(user)
    }
}
