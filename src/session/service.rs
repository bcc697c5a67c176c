use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{SessionError, SessionStore, TokenSigner, UserDirectory};

/// The logged-in user and the token proving it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: Value,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Google access token, kept for Drive downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_token: Option<String>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.get("id").and_then(Value::as_i64)
    }
}

/// Profile returned by Google sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleUserInfo {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

pub struct AuthService<D, S> {
    directory: D,
    store: S,
    signer: TokenSigner,
}

impl<D: UserDirectory, S: SessionStore> AuthService<D, S> {
    pub fn new(directory: D, store: S, signer: TokenSigner) -> Self {
        Self {
            directory,
            store,
            signer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn start(&self, user: Value, google_token: Option<String>) -> Result<Session, SessionError> {
        let id = user
            .get("id")
            .and_then(Value::as_i64)
            .ok_or(SessionError::MissingUserId)?;
        let email = user.get("email").and_then(Value::as_str).unwrap_or_default();
        let (token, claims) = self.signer.issue(id, email)?;

        let session = Session {
            user: without_password(user),
            token,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            google_token,
        };
        self.store.save(&session).await?;
        tracing::info!("Session started for user {}", id);
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        match self.directory.authenticate(email, password).await {
            Some(user) => self.start(user, None).await,
            None => Err(SessionError::InvalidCredentials),
        }
    }

    /// New users start with no role so the first login goes through onboarding.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session, SessionError> {
        if self.directory.find_by_email(email).await.is_some() {
            return Err(SessionError::EmailTaken(email.to_string()));
        }
        let user = self
            .directory
            .create_user(&json!({
                "name": name,
                "email": email,
                "password": password,
                "role": null,
            }))
            .await?;
        self.start(user, None).await
    }

    /// Sign in with a Google profile, creating the user on first visit.
    pub async fn login_with_google(
        &self,
        info: &GoogleUserInfo,
        access_token: Option<String>,
    ) -> Result<Session, SessionError> {
        let user = match self.directory.find_by_email(&info.email).await {
            Some(user) => user,
            None => {
                tracing::info!("Creating user for Google account {}", info.email);
                self.directory
                    .create_user(&json!({
                        "name": info.name,
                        "email": info.email,
                        "role": null,
                        "avatar": info.picture,
                    }))
                    .await?
            }
        };
        self.start(user, access_token).await
    }

    /// Drops the session along with any Google token it carried.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await
    }

    /// The stored session, unless it has expired or its token no longer verifies.
    pub async fn current(&self) -> Result<Option<Session>, SessionError> {
        let Some(session) = self.store.load().await? else {
            return Ok(None);
        };
        if session.is_expired() || self.signer.verify(&session.token).is_err() {
            tracing::debug!("Discarding stale session");
            self.store.clear().await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn update_profile(&self, updates: &Value) -> Result<Session, SessionError> {
        let mut session = self.current().await?.ok_or(SessionError::NoSession)?;
        let id = session.user_id().ok_or(SessionError::MissingUserId)?;
        let user = self
            .directory
            .update_user(id, updates)
            .await
            .ok_or(SessionError::UpdateFailed)?;
        session.user = without_password(user);
        self.store.save(&session).await?;
        Ok(session)
    }

    /// Re-issue the token of a live session with a fresh expiry.
    pub async fn refresh(&self) -> Result<Session, SessionError> {
        let session = self.current().await?.ok_or(SessionError::NoSession)?;
        self.start(session.user, session.google_token).await
    }
}

fn without_password(mut user: Value) -> Value {
    if let Some(obj) = user.as_object_mut() {
        obj.remove("password");
    }
    user
}
