use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::product::Product;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("catalog error: {0}")]
    Unavailable(String),
}

/// Outbound port for catalog reads. The order pipeline re-reads products
/// through this on every creation and never trusts client-supplied data.
#[async_trait]
pub trait Catalog: Send + Sync + 'static {
    /// Batch lookup. Unknown ids are simply absent from the result; the
    /// caller decides whether that is an error.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError>;
    async fn get(&self, id: Uuid) -> Result<Option<Product>, CatalogError>;
    /// All products, newest first.
    async fn list(&self) -> Result<Vec<Product>, CatalogError>;
}
