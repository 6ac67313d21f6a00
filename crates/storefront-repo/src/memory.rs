use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use storefront_types::domain::order::Order;
use storefront_types::domain::product::Product;
use storefront_types::ports::catalog::{Catalog, CatalogError};
use storefront_types::ports::order_repository::{OrderRepository, RepoError};
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryOrders {
    pub map: Arc<DashMap<Uuid, Order>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self {
            map: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryOrders {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.map.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.map.get(&id).map(|r| r.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepoError> {
        Ok(newest_first(
            self.map.iter().map(|kv| kv.value().clone()).collect(),
        ))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        Ok(newest_first(
            self.map
                .iter()
                .filter(|kv| kv.value().user_id == user_id)
                .map(|kv| kv.value().clone())
                .collect(),
        ))
    }

    async fn replace(&self, order: Order) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.map.get_mut(&order.id) {
            *v = order.clone();
            return Ok(Some(order));
        }
        Ok(None)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.map.remove(&id).is_some())
    }
}

#[derive(Clone)]
pub struct InMemoryCatalog {
    pub map: Arc<DashMap<Uuid, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            map: Arc::new(DashMap::new()),
        }
    }

    /// Direct insert used by seeding and tests. Catalog administration has
    /// no API surface in this pipeline.
    pub fn insert(&self, product: Product) {
        self.map.insert(product.id, product);
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.map.get(id).map(|r| r.clone()))
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        Ok(self.map.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        let mut products: Vec<Product> = self.map.iter().map(|kv| kv.value().clone()).collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }
}

/// Both in-memory adapters behind one handle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub orders: InMemoryOrders,
    pub catalog: InMemoryCatalog,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
