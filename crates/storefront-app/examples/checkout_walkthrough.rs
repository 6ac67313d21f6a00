///  To run :
///  cargo r --example checkout_walkthrough
use chrono::Utc;
use storefront_client::{AdminOrderUpdate, StorefrontClient};
use storefront_hex::application::order_service::OrderService;
use storefront_hex::auth::{sign_session, DEFAULT_SESSION_TTL_HOURS};
use storefront_hex::inbound::http::{HttpServer, HttpServerConfig};
use storefront_repo::build_store;
use storefront_types::domain::identity::{Identity, Role};
use storefront_types::domain::order::OrderStatus;
use storefront_types::domain::product::Product;
use tempfile::tempdir;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let secret = "walkthrough-secret";
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // File-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("storefront.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let store = build_store(Some(&db_url)).await?;
    let frock = Product {
        id: Uuid::new_v4(),
        name: "Linen frock".into(),
        slug: "linen-frock".into(),
        price_cents: 2500,
        images: vec!["/img/frock.jpg".into()],
        colors: vec![],
        sizes: vec!["M".into(), "L".into()],
        created_at: Utc::now(),
    };
    store.insert_product(frock.clone()).await?;

    let service = OrderService::new(store.clone(), store);
    let server = HttpServer::new(
        service,
        HttpServerConfig {
            port: port.to_string(),
            auth_secret: secret.into(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let shopper = Identity {
        user_id: Uuid::new_v4(),
        role: Role::User,
    };
    let shopper_token = sign_session(shopper, secret, DEFAULT_SESSION_TTL_HOURS)?;
    let admin = Identity {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let admin_token = sign_session(admin, secret, DEFAULT_SESSION_TTL_HOURS)?;

    // Shopper: fill the cart, check the enriched view, then check out.
    let shopper_client = StorefrontClient::builder(&addr)?
        .with_bearer_token(&shopper_token)?
        .build()?;
    let mut cart = storefront_client::CartStore::load(tmp.path().join("cart.json"));
    cart.add_line(frock.id, 1, Some("M".into()), None);
    cart.add_line(frock.id, 1, Some("M".into()), None);
    println!("Cart holds {} item(s)", cart.count());

    let view = shopper_client.enrich_cart(cart.cart()).await?;
    println!("Advisory subtotal: {} cents", view.subtotal_cents);
    assert_eq!(view.subtotal_cents, 5000);

    let order = shopper_client.checkout(&mut cart, None, None, None).await?;
    println!("Created order id={} status={:?}", order.id, order.status);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal_cents, 5000);
    assert!(cart.lines().is_empty());

    // Admin: walk the order through the fulfillment lifecycle.
    let admin_client = StorefrontClient::builder(&addr)?
        .with_bearer_token(&admin_token)?
        .build()?;
    for status in [OrderStatus::Paid, OrderStatus::Shipped] {
        let patch = AdminOrderUpdate {
            status: Some(status),
            ..Default::default()
        };
        let updated = admin_client
            .update_order(&order.id.to_string(), patch)
            .await?;
        println!(
            "Order now {:?} ({}/{})",
            updated.status,
            updated.status.progress_step(),
            OrderStatus::PROGRESS_STEPS
        );
    }

    // Shopper sees the shipped order in their history.
    let mine = shopper_client.my_orders().await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, OrderStatus::Shipped);
    println!("Shopper history: {} order(s)", mine.len());

    admin_client.delete_order(&order.id.to_string()).await?;
    println!("Deleted order");

    handle.abort();
    Ok(())
}
