pub mod token_manager;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use token_manager::TokenManager;

/// JWT claims. `sub` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is not active yet")]
    NotYetValid,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to issue token: {0}")]
    Internal(String),
}
