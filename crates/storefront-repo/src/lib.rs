#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use storefront_types::domain::order::Order;
use storefront_types::domain::product::Product;
use storefront_types::ports::catalog::{Catalog, CatalogError};
use storefront_types::ports::order_repository::{OrderRepository, RepoError};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Feature-selected storage facade implementing both outbound ports. When
/// both features are enabled the sqlite store wins.
#[derive(Clone)]
pub struct Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    memory: memory::MemoryStore,
    #[cfg(feature = "sqlite")]
    sqlite: sqlite::SqliteStore,
}

pub async fn build_store(url: Option<&str>) -> anyhow::Result<Store> {
    Store::build(url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            memory: memory::MemoryStore::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://storefront.db");
        let sqlite = sqlite::SqliteStore::new(url).await?;
        Ok(Self { sqlite })
    }

    /// Seeding hook; the catalog has no public write API.
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn insert_product(&self, product: Product) -> anyhow::Result<()> {
        self.memory.catalog.insert(product);
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    pub async fn insert_product(&self, product: Product) -> anyhow::Result<()> {
        self.sqlite.catalog.insert(&product).await?;
        Ok(())
    }
}

#[cfg(all(feature = "memory", not(feature = "sqlite")))]
#[async_trait]
impl OrderRepository for Store {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.memory.orders.create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.memory.orders.get(id).await
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepoError> {
        self.memory.orders.list_all().await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        self.memory.orders.list_for_user(user_id).await
    }

    async fn replace(&self, order: Order) -> Result<Option<Order>, RepoError> {
        self.memory.orders.replace(order).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.memory.orders.delete(id).await
    }
}

#[cfg(all(feature = "memory", not(feature = "sqlite")))]
#[async_trait]
impl Catalog for Store {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError> {
        self.memory.catalog.find_by_ids(ids).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        self.memory.catalog.get(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        self.memory.catalog.list().await
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl OrderRepository for Store {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.sqlite.orders.create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.sqlite.orders.get(id).await
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepoError> {
        self.sqlite.orders.list_all().await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        self.sqlite.orders.list_for_user(user_id).await
    }

    async fn replace(&self, order: Order) -> Result<Option<Order>, RepoError> {
        self.sqlite.orders.replace(order).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.sqlite.orders.delete(id).await
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl Catalog for Store {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError> {
        self.sqlite.catalog.find_by_ids(ids).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        self.sqlite.catalog.get(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        self.sqlite.catalog.list().await
    }
}
