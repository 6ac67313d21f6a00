//! storefront-client: shopper-side surface of the storefront.
//!
//! Holds the persistent cart ([`cart_store::CartStore`]), the HTTP API
//! client, and the read-time enrichment join that pairs cart lines with
//! live catalog data. Enriched subtotals are advisory only; the server
//! recomputes the authoritative subtotal at checkout.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use storefront_types::domain::cart::{Cart, CartLine};
use storefront_types::domain::order::{Address, Order, OrderStatus};
use storefront_types::domain::product::Product;
use uuid::Uuid;

pub mod cart_store;

pub use cart_store::CartStore;

#[derive(Clone)]
pub struct StorefrontClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct StorefrontClient {
    base: Url,
    client: reqwest::Client,
}

/// One submitted cart line; mirrors the server-side request shape. No
/// price field exists here by design.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub qty: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<&CartLine> for OrderItemInput {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            qty: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AdminOrderUpdate {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub items: Option<Vec<storefront_types::domain::order::OrderItem>>,
}

/// A cart line joined with its current catalog product.
#[derive(Debug, Clone)]
pub struct EnrichedLine {
    pub line: CartLine,
    pub product: Product,
}

impl EnrichedLine {
    pub fn line_total_cents(&self) -> i64 {
        self.product.price_cents * i64::from(self.line.quantity)
    }
}

/// Read-time view of the cart. Lines whose product did not resolve are
/// absent from `rows` but remain in the stored aggregate.
#[derive(Debug, Clone)]
pub struct CartView {
    pub rows: Vec<EnrichedLine>,
    /// Advisory display subtotal from current catalog prices.
    pub subtotal_cents: i64,
}

impl StorefrontClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<StorefrontClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(StorefrontClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn create_order(&self, req: CreateOrderRequest) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url("orders")?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_order(&self, id: &str) -> anyhow::Result<Order> {
        let res = self
            .client
            .get(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn my_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url("orders/mine")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url("orders")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_order(&self, id: &str, patch: AdminOrderUpdate) -> anyhow::Result<Order> {
        let res = self
            .client
            .put(self.url(&format!("orders/{id}"))?)
            .json(&patch)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn delete_order(&self, id: &str) -> anyhow::Result<()> {
        self.client
            .delete(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let res = self
            .client
            .get(self.url("products")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn products_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let joined = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let res = self
            .client
            .get(self.url("products")?)
            .query(&[("ids", joined)])
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_product(&self, id: &str) -> anyhow::Result<Product> {
        let res = self
            .client
            .get(self.url(&format!("products/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    /// Joins each cart line to its current product with one batch lookup.
    /// Lines whose product is gone are dropped from the view only.
    pub async fn enrich_cart(&self, cart: &Cart) -> anyhow::Result<CartView> {
        let ids = cart.distinct_product_ids();
        let products = self.products_by_ids(&ids).await?;
        let rows: Vec<EnrichedLine> = cart
            .lines
            .iter()
            .filter_map(|line| {
                products
                    .iter()
                    .find(|p| p.id == line.product_id)
                    .map(|product| EnrichedLine {
                        line: line.clone(),
                        product: product.clone(),
                    })
            })
            .collect();
        let subtotal_cents = rows.iter().map(EnrichedLine::line_total_cents).sum();
        Ok(CartView {
            rows,
            subtotal_cents,
        })
    }

    /// Submits the cart as an order and clears it on success. A rejected
    /// submission leaves the cart untouched for another attempt.
    pub async fn checkout(
        &self,
        store: &mut CartStore,
        shipping_address: Option<Address>,
        billing_address: Option<Address>,
        note: Option<String>,
    ) -> anyhow::Result<Order> {
        let req = CreateOrderRequest {
            items: store.lines().iter().map(OrderItemInput::from).collect(),
            shipping_address,
            billing_address,
            note,
        };
        let order = self.create_order(req).await?;
        store.clear();
        Ok(order)
    }
}

impl StorefrontClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Session token for authenticated calls; sent as a bearer header.
    pub fn with_bearer_token(mut self, token: impl AsRef<str>) -> anyhow::Result<Self> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
            .context("invalid token value")?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<StorefrontClient> {
        if let Some(client) = self.client {
            return Ok(StorefrontClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(StorefrontClient {
            base: self.base,
            client,
        })
    }
}
