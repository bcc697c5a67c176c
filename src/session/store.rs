use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Session, SessionError};

/// Holds at most one current session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, SessionError>;
    async fn save(&self, session: &Session) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

/// Session kept as pretty JSON in a single file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.current.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.current.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.current.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn session() -> Session {
        let now = Utc::now();
        Session {
            user: json!({"id": 1, "name": "Ana", "email": "ana@example.com"}),
            token: "token".to_string(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
            google_token: Some("ya29.token".to_string()),
        }
    }

    #[tokio::test]
    async fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().await.unwrap().is_none());
        store.save(&session()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.user["email"], "ana@example.com");
        assert_eq!(loaded.google_token.as_deref(), Some("ya29.token"));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{oops").unwrap();
        let store = FileSessionStore::new(path);
        assert!(matches!(store.load().await, Err(SessionError::Json(_))));
    }

    #[tokio::test]
    async fn memory_store_holds_one_session() {
        let store = MemorySessionStore::new();
        store.save(&session()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
