use std::collections::HashMap;

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use storefront_types::domain::identity::Identity;
use storefront_types::domain::order::{Address, Order, OrderItem, OrderStatus};
use storefront_types::domain::product::Product;
use storefront_types::ports::catalog::Catalog;
use storefront_types::ports::order_repository::OrderRepository;
use uuid::Uuid;

/// One submitted cart line. Carries no price: pricing is always re-read
/// from the catalog, and any price a client smuggles in is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub qty: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Admin-only field whitelist for order edits. Anything else on an order is
/// immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
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
    pub items: Option<Vec<OrderItem>>,
}

pub struct OrderService<R: OrderRepository, C: Catalog> {
    orders: R,
    catalog: C,
}

fn internal<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Internal(anyhow::anyhow!(e.to_string()))
}

impl<R: OrderRepository, C: Catalog> OrderService<R, C> {
    pub fn new(orders: R, catalog: C) -> Self {
        Self { orders, catalog }
    }

    /// Turns a submitted cart into a persisted order. All-or-nothing: any
    /// unknown product or invalid variant rejects the whole submission
    /// before anything is written.
    pub async fn create_order(
        &self,
        identity: Identity,
        req: CreateOrderRequest,
    ) -> Result<Order, AppError> {
        if req.items.is_empty() {
            return Err(AppError::Validation("no items in order".into()));
        }

        let mut ids: Vec<Uuid> = Vec::new();
        for it in &req.items {
            if !ids.contains(&it.product_id) {
                ids.push(it.product_id);
            }
        }
        let products = self.catalog.find_by_ids(&ids).await.map_err(internal)?;
        let by_id: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();

        let mut items = Vec::with_capacity(req.items.len());
        for it in &req.items {
            let product = by_id.get(&it.product_id).ok_or_else(|| {
                AppError::Validation(format!("unknown product {}", it.product_id))
            })?;
            if !product.allows_size(it.size.as_deref()) {
                return Err(AppError::Validation(format!(
                    "invalid size for {}",
                    product.name
                )));
            }
            if !product.allows_color(it.color.as_deref()) {
                return Err(AppError::Validation(format!(
                    "invalid color for {}",
                    product.name
                )));
            }
            items.push(OrderItem {
                product_id: product.id,
                name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity: it.qty.max(1),
                size: it.size.clone(),
                color: it.color.clone(),
                image: product.cover_image().to_string(),
            });
        }

        let order = Order::new(
            identity.user_id,
            items,
            req.shipping_address.unwrap_or_default(),
            req.billing_address.unwrap_or_default(),
            req.note.unwrap_or_default(),
        )
        .map_err(|e| AppError::Validation(e.to_string()))?;

        let stored = self.orders.create(order).await.map_err(internal)?;
        tracing::info!(
            order_id = %stored.id,
            user_id = %stored.user_id,
            subtotal_cents = stored.subtotal_cents,
            "order created"
        );
        Ok(stored)
    }

    pub async fn get_order(&self, identity: Identity, id: Uuid) -> Result<Order, AppError> {
        let order = self
            .orders
            .get(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;
        if !identity.can_view_order_of(order.user_id) {
            return Err(AppError::Forbidden);
        }
        Ok(order)
    }

    /// The caller's own orders, newest first.
    pub async fn list_my_orders(&self, identity: Identity) -> Result<Vec<Order>, AppError> {
        self.orders
            .list_for_user(identity.user_id)
            .await
            .map_err(internal)
    }

    /// Every order in the store, newest first. Admin only.
    pub async fn list_all_orders(&self, identity: Identity) -> Result<Vec<Order>, AppError> {
        if !identity.is_admin() {
            return Err(AppError::Forbidden);
        }
        self.orders.list_all().await.map_err(internal)
    }

    /// Admin edit across the mutable-field whitelist. An item replacement
    /// always recomputes the subtotal server-side.
    pub async fn update_order(
        &self,
        identity: Identity,
        id: Uuid,
        patch: AdminOrderUpdate,
    ) -> Result<Order, AppError> {
        if !identity.is_admin() {
            return Err(AppError::Forbidden);
        }
        let mut order = self
            .orders
            .get(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;

        if let Some(status) = patch.status {
            // No transition table: admins may set any status at any time.
            order.set_status(status);
        }
        if let Some(note) = patch.note {
            order.note = note;
        }
        if let Some(shipping) = patch.shipping_address {
            order.shipping_address = shipping;
        }
        if let Some(billing) = patch.billing_address {
            order.billing_address = billing;
        }
        if let Some(items) = patch.items {
            order
                .replace_items(items)
                .map_err(|e| AppError::Validation(e.to_string()))?;
        }

        match self.orders.replace(order).await.map_err(internal)? {
            Some(updated) => Ok(updated),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    /// Permanent removal. Deleting an id that no longer exists still
    /// succeeds; the handler answers 204 either way.
    pub async fn delete_order(&self, identity: Identity, id: Uuid) -> Result<(), AppError> {
        if !identity.is_admin() {
            return Err(AppError::Forbidden);
        }
        let existed = self.orders.delete(id).await.map_err(internal)?;
        tracing::info!(order_id = %id, existed, "order deleted");
        Ok(())
    }

    /// Catalog reads backing the storefront and the cart enrichment join.
    pub async fn list_products(&self, ids: Option<&[Uuid]>) -> Result<Vec<Product>, AppError> {
        match ids {
            Some(ids) => self.catalog.find_by_ids(ids).await.map_err(internal),
            None => self.catalog.list().await.map_err(internal),
        }
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog
            .get(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_repo::memory::{InMemoryCatalog, InMemoryOrders};
    use storefront_types::domain::identity::Role;

    fn shopper() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role: Role::User,
        }
    }

    fn admin() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    fn product(name: &str, price_cents: i64, sizes: &[&str]) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase().replace(' ', "-"),
            price_cents,
            images: vec![format!("/img/{name}.jpg")],
            colors: vec![],
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn service(
        products: Vec<Product>,
    ) -> OrderService<InMemoryOrders, InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        for p in products {
            catalog.insert(p);
        }
        OrderService::new(InMemoryOrders::new(), catalog)
    }

    fn request_for(product_id: Uuid, qty: u32, size: Option<&str>) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![OrderItemInput {
                product_id,
                qty,
                size: size.map(String::from),
                color: None,
            }],
            shipping_address: None,
            billing_address: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn create_snapshots_catalog_price_and_computes_subtotal() {
        let p1 = product("Linen frock", 2500, &["M", "L"]);
        let svc = service(vec![p1.clone()]);
        let caller = shopper();

        let order = svc
            .create_order(caller, request_for(p1.id, 2, Some("M")))
            .await
            .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].unit_price_cents, 2500);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].image, p1.images[0]);
        assert_eq!(order.subtotal_cents, 5000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.user_id, caller.user_id);
    }

    #[tokio::test]
    async fn unknown_product_rejects_whole_submission() {
        let p1 = product("Linen frock", 2500, &[]);
        let svc = service(vec![p1.clone()]);

        let req = CreateOrderRequest {
            items: vec![
                OrderItemInput {
                    product_id: p1.id,
                    qty: 1,
                    size: None,
                    color: None,
                },
                OrderItemInput {
                    product_id: Uuid::new_v4(),
                    qty: 1,
                    size: None,
                    color: None,
                },
            ],
            shipping_address: None,
            billing_address: None,
            note: None,
        };
        let res = svc.create_order(shopper(), req).await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        // no partial order was written
        let all = svc.list_all_orders(admin()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn invalid_variant_rejected_naming_product() {
        let p1 = product("Leather slippers", 4200, &["38", "40"]);
        let svc = service(vec![p1.clone()]);

        let res = svc
            .create_order(shopper(), request_for(p1.id, 1, Some("44")))
            .await;
        match res {
            Err(AppError::Validation(msg)) => assert!(msg.contains("Leather slippers")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(svc.list_all_orders(admin()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_qty_clamps_to_one_and_empty_items_rejected() {
        let p1 = product("Silk blouse", 1800, &[]);
        let svc = service(vec![p1.clone()]);

        let order = svc
            .create_order(shopper(), request_for(p1.id, 0, None))
            .await
            .unwrap();
        assert_eq!(order.items[0].quantity, 1);
        assert_eq!(order.subtotal_cents, 1800);

        let empty = CreateOrderRequest {
            items: vec![],
            shipping_address: None,
            billing_address: None,
            note: None,
        };
        assert!(matches!(
            svc.create_order(shopper(), empty).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn visibility_owner_admin_stranger() {
        let p1 = product("Wool skirt", 3100, &[]);
        let svc = service(vec![p1.clone()]);
        let owner = shopper();

        let order = svc
            .create_order(owner, request_for(p1.id, 1, None))
            .await
            .unwrap();

        assert!(svc.get_order(owner, order.id).await.is_ok());
        assert!(svc.get_order(admin(), order.id).await.is_ok());
        assert!(matches!(
            svc.get_order(shopper(), order.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            svc.get_order(owner, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_mine_filters_by_owner_newest_first() {
        let p1 = product("Canvas bag", 2200, &[]);
        let svc = service(vec![p1.clone()]);
        let alice = shopper();
        let bob = shopper();

        let first = svc
            .create_order(alice, request_for(p1.id, 1, None))
            .await
            .unwrap();
        let second = svc
            .create_order(alice, request_for(p1.id, 2, None))
            .await
            .unwrap();
        svc.create_order(bob, request_for(p1.id, 3, None))
            .await
            .unwrap();

        let mine = svc.list_my_orders(alice).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
        assert_eq!(mine[1].id, first.id);

        assert!(matches!(
            svc.list_all_orders(alice).await,
            Err(AppError::Forbidden)
        ));
        assert_eq!(svc.list_all_orders(admin()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn admin_item_replacement_recomputes_subtotal() {
        let p1 = product("Linen frock", 2500, &[]);
        let svc = service(vec![p1.clone()]);

        let order = svc
            .create_order(shopper(), request_for(p1.id, 2, None))
            .await
            .unwrap();
        assert_eq!(order.subtotal_cents, 5000);

        let patch = AdminOrderUpdate {
            items: Some(vec![OrderItem {
                product_id: p1.id,
                name: p1.name.clone(),
                unit_price_cents: 1000,
                quantity: 3,
                size: None,
                color: None,
                image: String::new(),
            }]),
            ..Default::default()
        };
        let updated = svc.update_order(admin(), order.id, patch).await.unwrap();
        assert_eq!(updated.subtotal_cents, 3000);

        // replacing with an empty list is invalid and leaves the order alone
        let emptied = AdminOrderUpdate {
            items: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            svc.update_order(admin(), order.id, emptied).await,
            Err(AppError::Validation(_))
        ));
        let unchanged = svc.get_order(admin(), order.id).await.unwrap();
        assert_eq!(unchanged.subtotal_cents, 3000);
    }

    #[tokio::test]
    async fn status_updates_are_admin_only_and_unrestricted() {
        let p1 = product("Linen frock", 2500, &[]);
        let svc = service(vec![p1.clone()]);
        let owner = shopper();
        let order = svc
            .create_order(owner, request_for(p1.id, 1, None))
            .await
            .unwrap();

        let as_owner = AdminOrderUpdate {
            status: Some(OrderStatus::Paid),
            ..Default::default()
        };
        assert!(matches!(
            svc.update_order(owner, order.id, as_owner).await,
            Err(AppError::Forbidden)
        ));

        for status in [
            OrderStatus::Cancelled,
            OrderStatus::Shipped,
            OrderStatus::Pending,
        ] {
            let patch = AdminOrderUpdate {
                status: Some(status),
                ..Default::default()
            };
            let updated = svc.update_order(admin(), order.id, patch).await.unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn delete_is_admin_only_and_idempotent() {
        let p1 = product("Linen frock", 2500, &[]);
        let svc = service(vec![p1.clone()]);
        let owner = shopper();
        let order = svc
            .create_order(owner, request_for(p1.id, 1, None))
            .await
            .unwrap();

        assert!(matches!(
            svc.delete_order(owner, order.id).await,
            Err(AppError::Forbidden)
        ));

        svc.delete_order(admin(), order.id).await.unwrap();
        assert!(matches!(
            svc.get_order(admin(), order.id).await,
            Err(AppError::NotFound(_))
        ));

        // deleting again still reports success
        svc.delete_order(admin(), order.id).await.unwrap();
    }

    #[tokio::test]
    async fn product_reads() {
        let p1 = product("Linen frock", 2500, &[]);
        let p2 = product("Canvas bag", 2200, &[]);
        let svc = service(vec![p1.clone(), p2.clone()]);

        let all = svc.list_products(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let some = svc.list_products(Some(&[p1.id])).await.unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].id, p1.id);

        let one = svc.get_product(p2.id).await.unwrap();
        assert_eq!(one.name, "Canvas bag");
        assert!(matches!(
            svc.get_product(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
