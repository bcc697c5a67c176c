//! Signed, expiring sessions for CRM users.

pub mod directory;
pub mod service;
pub mod store;
pub mod token;

use thiserror::Error;

use crate::client::ClientError;

pub use directory::UserDirectory;
pub use service::{AuthService, GoogleUserInfo, Session};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use token::{Claims, TokenSigner};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session secret is not configured")]
    InvalidSecret,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("User record has no id")]
    MissingUserId,

    #[error("Not logged in")]
    NoSession,

    #[error("Profile update failed")]
    UpdateFailed,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}
