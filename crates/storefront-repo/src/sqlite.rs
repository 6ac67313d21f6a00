use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use storefront_types::domain::order::{Address, Order, OrderItem, OrderStatus};
use storefront_types::domain::product::Product;
use storefront_types::ports::catalog::{Catalog, CatalogError};
use storefront_types::ports::order_repository::{OrderRepository, RepoError};
use uuid::Uuid;

fn status_to_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Paid => "paid",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Cancelled => "cancelled",
    }
}

fn status_from_str(s: &str) -> OrderStatus {
    match s {
        "paid" => OrderStatus::Paid,
        "shipped" => OrderStatus::Shipped,
        "cancelled" => OrderStatus::Cancelled,
        _ => OrderStatus::Pending,
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::DbError(e.to_string()))?
        .with_timezone(&Utc))
}

/// Typed row at the storage boundary. Nothing storage-internal leaks into
/// the domain `Order`.
#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    subtotal_cents: i64,
    status: String,
    note: String,
    shipping_json: String,
    billing_json: String,
    items_json: String,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let items: Vec<OrderItem> = serde_json::from_str(&self.items_json)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        let shipping_address: Address = serde_json::from_str(&self.shipping_json)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        let billing_address: Address = serde_json::from_str(&self.billing_json)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        let id = Uuid::parse_str(&self.id).map_err(|e| RepoError::DbError(e.to_string()))?;
        let user_id =
            Uuid::parse_str(&self.user_id).map_err(|e| RepoError::DbError(e.to_string()))?;
        Ok(Order {
            id,
            user_id,
            items,
            subtotal_cents: self.subtotal_cents,
            status: status_from_str(&self.status),
            shipping_address,
            billing_address,
            note: self.note,
            created_at: parse_rfc3339(&self.created_at)?,
            updated_at: parse_rfc3339(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    name: String,
    slug: String,
    price_cents: i64,
    images_json: String,
    colors_json: String,
    sizes_json: String,
    created_at: String,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, CatalogError> {
        let parse_list = |json: &str| -> Result<Vec<String>, CatalogError> {
            serde_json::from_str(json).map_err(|e| CatalogError::Unavailable(e.to_string()))
        };
        let id = Uuid::parse_str(&self.id).map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?
            .with_timezone(&Utc);
        Ok(Product {
            id,
            name: self.name,
            slug: self.slug,
            price_cents: self.price_cents,
            images: parse_list(&self.images_json)?,
            colors: parse_list(&self.colors_json)?,
            sizes: parse_list(&self.sizes_json)?,
            created_at,
        })
    }
}

#[derive(Clone)]
pub struct SqliteOrders {
    pool: SqlitePool,
}

#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

/// Explicitly constructed store handle; owns the pool for its lifetime.
/// Built once at startup and injected, never cached in a process global.
#[derive(Clone)]
pub struct SqliteStore {
    pub orders: SqliteOrders,
    pub catalog: SqliteCatalog,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migrations from the embedded files.
        for ddl in [
            include_str!("../migrations/0001_create_orders.sql"),
            include_str!("../migrations/0002_create_products.sql"),
        ] {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self {
            orders: SqliteOrders { pool: pool.clone() },
            catalog: SqliteCatalog { pool },
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, subtotal_cents, status, note, shipping_json, \
     billing_json, items_json, created_at, updated_at";

#[async_trait]
impl OrderRepository for SqliteOrders {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json =
            serde_json::to_string(&order.items).map_err(|e| RepoError::DbError(e.to_string()))?;
        let shipping_json = serde_json::to_string(&order.shipping_address)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        let billing_json = serde_json::to_string(&order.billing_address)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, subtotal_cents, status, note, shipping_json, \
             billing_json, items_json, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(order.subtotal_cents)
        .bind(status_to_str(order.status))
        .bind(&order.note)
        .bind(shipping_json)
        .bind(billing_json)
        .bind(items_json)
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::DbError(e.to_string()))?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }

    async fn replace(&self, order: Order) -> Result<Option<Order>, RepoError> {
        let items_json =
            serde_json::to_string(&order.items).map_err(|e| RepoError::DbError(e.to_string()))?;
        let shipping_json = serde_json::to_string(&order.shipping_address)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        let billing_json = serde_json::to_string(&order.billing_address)
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        let updated = sqlx::query(
            "UPDATE orders SET subtotal_cents = ?, status = ?, note = ?, shipping_json = ?, \
             billing_json = ?, items_json = ?, updated_at = ? WHERE id = ?",
        )
        .bind(order.subtotal_cents)
        .bind(status_to_str(order.status))
        .bind(&order.note)
        .bind(shipping_json)
        .bind(billing_json)
        .bind(items_json)
        .bind(order.updated_at.to_rfc3339())
        .bind(order.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(order.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::DbError(e.to_string()))?;
        Ok(res.rows_affected() > 0)
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, slug, price_cents, images_json, colors_json, sizes_json, created_at";

impl SqliteCatalog {
    /// Direct insert used by seeding and tests. Catalog administration has
    /// no API surface in this pipeline.
    pub async fn insert(&self, product: &Product) -> Result<(), CatalogError> {
        let to_json = |v: &Vec<String>| -> Result<String, CatalogError> {
            serde_json::to_string(v).map_err(|e| CatalogError::Unavailable(e.to_string()))
        };
        sqlx::query(
            "INSERT INTO products (id, name, slug, price_cents, images_json, colors_json, \
             sizes_json, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.price_cents)
        .bind(to_json(&product.images)?)
        .bind(to_json(&product.colors)?)
        .bind(to_json(&product.sizes)?)
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, DbProduct>(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        rows.into_iter().map(DbProduct::into_product).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        let row: Option<DbProduct> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        row.map(DbProduct::into_product).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        let rows: Vec<DbProduct> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        rows.into_iter().map(DbProduct::into_product).collect()
    }
}
