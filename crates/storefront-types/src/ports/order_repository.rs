use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::Order;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
}

/// Outbound port for order persistence. List methods return newest first.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn list_all(&self) -> Result<Vec<Order>, RepoError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError>;
    /// Overwrites an existing order in full. `None` when the id is unknown.
    async fn replace(&self, order: Order) -> Result<Option<Order>, RepoError>;
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}
