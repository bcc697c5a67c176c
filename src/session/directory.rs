use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ClientError, CrmClient};
use crate::database::Table;

/// Where user records live.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<Value>;
    async fn authenticate(&self, email: &str, password: &str) -> Option<Value>;
    async fn create_user(&self, user: &Value) -> Result<Value, ClientError>;
    async fn update_user(&self, id: i64, updates: &Value) -> Option<Value>;
}

#[async_trait]
impl UserDirectory for CrmClient {
    async fn find_by_email(&self, email: &str) -> Option<Value> {
        self.get_by_email(email).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Option<Value> {
        CrmClient::authenticate(self, email, password).await
    }

    async fn create_user(&self, user: &Value) -> Result<Value, ClientError> {
        self.add(Table::Users, user).await
    }

    async fn update_user(&self, id: i64, updates: &Value) -> Option<Value> {
        self.update(Table::Users, id, updates).await
    }
}
