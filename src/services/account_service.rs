//! Domain service for accounts: signup, login, Google sign-in and profile
//! changes.

use thiserror::Error;

use crate::auth::TokenError;
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered with a password")]
    EmailRegisteredWithPassword,

    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("Google sign-in failed: {0}")]
    GoogleRejected(String),

    #[error("Google account is being created by another sign-in")]
    GoogleAccountConflict,

    #[error("Google sign-in is not configured")]
    GoogleDisabled,

    #[error("User not found")]
    UserNotFound,

    #[error("Movie not found: {0}")]
    MovieNotFound(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<crate::db::StoreError> for AccountError {
    fn from(err: crate::db::StoreError) -> Self {
        use crate::db::StoreError;
        match err {
            StoreError::Duplicate(column) => match column.as_str() {
                "email" => Self::EmailTaken,
                "username" => Self::UsernameTaken,
                _ => Self::Database(format!("Duplicate value for {column}")),
            },
            StoreError::NotFound => Self::UserNotFound,
            StoreError::Db(e) => e.into(),
            StoreError::Other(e) => e.into(),
        }
    }
}

/// A signed-in user together with a fresh session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a password account and signs it in.
    async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AccountError>;

    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] for an unknown email, a
    /// wrong password, or an account without a password.
    async fn login(&self, email: &str, password: &str) -> Result<Session, AccountError>;

    /// Signs in with a Google ID token, creating the account on first use.
    async fn google_login(&self, id_token: &str) -> Result<Session, AccountError>;

    /// Changes the password. Accounts without one (Google-only) may set a
    /// first password without `current`.
    async fn change_password(
        &self,
        user_id: i32,
        current: Option<&str>,
        new_password: &str,
    ) -> Result<(), AccountError>;

    async fn me(&self, user_id: i32) -> Result<User, AccountError>;

    async fn update_username(&self, user_id: i32, username: &str) -> Result<User, AccountError>;
}
