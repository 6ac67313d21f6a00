use storefront_hex::application::order_service::OrderService;
use storefront_hex::auth::{sign_session, DEFAULT_SESSION_TTL_HOURS};
use storefront_hex::inbound::http::{HttpServer, HttpServerConfig};
use storefront_repo::memory::{InMemoryCatalog, InMemoryOrders};
use storefront_types::domain::identity::{Identity, Role};
use storefront_types::domain::order::{Order, OrderStatus};
use storefront_types::domain::product::Product;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn frock() -> Product {
    Product {
        id: Uuid::new_v4(),
        name: "Linen frock".into(),
        slug: "linen-frock".into(),
        price_cents: 2500,
        images: vec!["/img/frock.jpg".into()],
        colors: vec![],
        sizes: vec!["M".into(), "L".into()],
        created_at: chrono::Utc::now(),
    }
}

async fn spawn_server(products: Vec<Product>) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let catalog = InMemoryCatalog::new();
    for p in products {
        catalog.insert(p);
    }
    let service = OrderService::new(InMemoryOrders::new(), catalog);
    let server = HttpServer::new(
        service,
        HttpServerConfig {
            port: port.to_string(),
            auth_secret: SECRET.into(),
        },
    )
    .await
    .unwrap();
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (format!("http://127.0.0.1:{port}"), handle)
}

fn token_for(role: Role) -> (Identity, String) {
    let identity = Identity {
        user_id: Uuid::new_v4(),
        role,
    };
    let token = sign_session(identity, SECRET, DEFAULT_SESSION_TTL_HOURS).unwrap();
    (identity, token)
}

#[tokio::test]
async fn checkout_and_fulfillment_over_http() {
    let product = frock();
    let (addr, handle) = spawn_server(vec![product.clone()]).await;
    let client = reqwest::Client::new();

    let (shopper, shopper_token) = token_for(Role::User);
    let (_, stranger_token) = token_for(Role::User);
    let (_, admin_token) = token_for(Role::Admin);

    // A smuggled price on the wire is ignored: the catalog is authoritative.
    let body = serde_json::json!({
        "items": [{
            "product_id": product.id,
            "qty": 2,
            "size": "M",
            "unit_price_cents": 1
        }],
        "note": "ring the bell"
    });

    let res = client
        .post(format!("{addr}/orders"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{addr}/orders"))
        .bearer_auth(&shopper_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let order: Order = res.json().await.unwrap();
    assert_eq!(order.user_id, shopper.user_id);
    assert_eq!(order.items[0].unit_price_cents, 2500);
    assert_eq!(order.subtotal_cents, 5000);
    assert_eq!(order.status, OrderStatus::Pending);

    // visibility: stranger 403, owner and admin 200
    let res = client
        .get(format!("{addr}/orders/{}", order.id))
        .bearer_auth(&stranger_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);

    let fetched: Order = client
        .get(format!("{addr}/orders/{}", order.id))
        .bearer_auth(&shopper_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.id, order.id);

    let mine: Vec<Order> = client
        .get(format!("{addr}/orders/mine"))
        .bearer_auth(&shopper_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);

    // full listing is admin only
    let res = client
        .get(format!("{addr}/orders"))
        .bearer_auth(&shopper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);

    let all: Vec<Order> = client
        .get(format!("{addr}/orders"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    // admin replaces items; any subtotal in the body is ignored
    let patch = serde_json::json!({
        "status": "paid",
        "subtotal_cents": 99,
        "items": [{
            "product_id": product.id,
            "name": product.name,
            "unit_price_cents": 1000,
            "quantity": 3,
            "size": null,
            "color": null,
            "image": ""
        }]
    });
    let res = client
        .put(format!("{addr}/orders/{}", order.id))
        .bearer_auth(&admin_token)
        .json(&patch)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let updated: Order = res.json().await.unwrap();
    assert_eq!(updated.subtotal_cents, 3000);
    assert_eq!(updated.status, OrderStatus::Paid);

    // deletion is admin only and answers 204
    let res = client
        .delete(format!("{addr}/orders/{}", order.id))
        .bearer_auth(&shopper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{addr}/orders/{}", order.id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);

    handle.abort();
}

#[tokio::test]
async fn rejected_submissions_write_nothing() {
    let product = frock();
    let (addr, handle) = spawn_server(vec![product.clone()]).await;
    let client = reqwest::Client::new();

    let (_, shopper_token) = token_for(Role::User);
    let (_, admin_token) = token_for(Role::Admin);

    // empty item list
    let res = client
        .post(format!("{addr}/orders"))
        .bearer_auth(&shopper_token)
        .json(&serde_json::json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    // one valid item plus one unknown product fails the whole submission
    let res = client
        .post(format!("{addr}/orders"))
        .bearer_auth(&shopper_token)
        .json(&serde_json::json!({
            "items": [
                { "product_id": product.id, "qty": 1 },
                { "product_id": Uuid::new_v4(), "qty": 1 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    // a size outside the declared set is rejected, naming the product
    let res = client
        .post(format!("{addr}/orders"))
        .bearer_auth(&shopper_token)
        .json(&serde_json::json!({
            "items": [{ "product_id": product.id, "qty": 1, "size": "XS" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert!(err["error"].as_str().unwrap().contains("Linen frock"));

    // nothing was created by any of the rejected submissions
    let all: Vec<Order> = client
        .get(format!("{addr}/orders"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(all.is_empty());

    // unknown order id is a 404 for an authenticated caller
    let res = client
        .get(format!("{addr}/orders/{}", Uuid::new_v4()))
        .bearer_auth(&shopper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    handle.abort();
}

#[tokio::test]
async fn product_reads_are_public() {
    let p1 = frock();
    let mut p2 = frock();
    p2.id = Uuid::new_v4();
    p2.name = "Canvas bag".into();
    p2.slug = "canvas-bag".into();
    let (addr, handle) = spawn_server(vec![p1.clone(), p2.clone()]).await;
    let client = reqwest::Client::new();

    let all: Vec<Product> = client
        .get(format!("{addr}/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // batch fetch drops unknown ids silently
    let batch: Vec<Product> = client
        .get(format!("{addr}/products"))
        .query(&[("ids", format!("{},{}", p1.id, Uuid::new_v4()))])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, p1.id);

    let one: Product = client
        .get(format!("{addr}/products/{}", p2.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(one.slug, "canvas-bag");

    let res = client
        .get(format!("{addr}/products/{}", Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    handle.abort();
}

#[tokio::test]
async fn bad_tokens_are_unauthorized() {
    let (addr, handle) = spawn_server(vec![]).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{addr}/orders/mine"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    // token signed with a different secret
    let identity = Identity {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let forged = sign_session(identity, "wrong-secret", 1).unwrap();
    let res = client
        .get(format!("{addr}/orders"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    handle.abort();
}
