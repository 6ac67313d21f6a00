use chrono::Utc;
use serde::Deserialize;
use storefront_hex::application::order_service::OrderService;
use storefront_hex::config::Config;
use storefront_hex::inbound::http::{HttpServer, HttpServerConfig};
use storefront_repo::{build_store, Store};
use storefront_types::domain::product::Product;
use storefront_types::ports::catalog::Catalog;
use uuid::Uuid;

/// Catalog seed entry; ids and timestamps are assigned on insert.
#[derive(Deserialize)]
struct SeedProduct {
    name: String,
    slug: String,
    price_cents: i64,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    sizes: Vec<String>,
}

/// Loads demo products into an empty catalog. A non-empty catalog is left
/// alone so restarts never duplicate rows.
async fn seed_catalog(store: &Store, path: &str) -> anyhow::Result<()> {
    if !store.list().await?.is_empty() {
        tracing::debug!("catalog already populated, skipping seed");
        return Ok(());
    }
    let raw = tokio::fs::read_to_string(path).await?;
    let seeds: Vec<SeedProduct> = serde_json::from_str(&raw)?;
    let count = seeds.len();
    for seed in seeds {
        store
            .insert_product(Product {
                id: Uuid::new_v4(),
                name: seed.name,
                slug: seed.slug,
                price_cents: seed.price_cents,
                images: seed.images,
                colors: seed.colors,
                sizes: seed.sizes,
                created_at: Utc::now(),
            })
            .await?;
    }
    tracing::info!(count, "seeded catalog from {path}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / AUTH_SECRET when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let store: Store = build_store(config.database_url.as_deref()).await?;
    if let Some(path) = &config.seed_products {
        seed_catalog(&store, path).await?;
    }
    let service = OrderService::new(store.clone(), store);

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        auth_secret: config.auth_secret.clone(),
    };

    let http = HttpServer::new(service, server_cfg).await?;
    http.run().await
}
