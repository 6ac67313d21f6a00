use axum::{
    extract::{FromRef, Path, Query, State},
    routing::{delete, get, post, put},
    serve, Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::{AdminOrderUpdate, CreateOrderRequest, OrderService};
use crate::auth::{CallerIdentity, TokenVerifier};
use crate::errors::AppError;
use storefront_types::domain::order::Order;
use storefront_types::domain::product::Product;
use storefront_types::ports::catalog::Catalog;
use storefront_types::ports::order_repository::OrderRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub auth_secret: String,
}

pub struct AppState<R: OrderRepository, C: Catalog> {
    pub service: Arc<OrderService<R, C>>,
    pub verifier: TokenVerifier,
}

impl<R: OrderRepository, C: Catalog> Clone for AppState<R, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            verifier: self.verifier.clone(),
        }
    }
}

impl<R: OrderRepository, C: Catalog> FromRef<AppState<R, C>> for TokenVerifier {
    fn from_ref(state: &AppState<R, C>) -> Self {
        state.verifier.clone()
    }
}

impl<R: OrderRepository, C: Catalog> FromRef<AppState<R, C>> for Arc<OrderService<R, C>> {
    fn from_ref(state: &AppState<R, C>) -> Self {
        Arc::clone(&state.service)
    }
}

pub struct HttpServer<R: OrderRepository, C: Catalog> {
    state: AppState<R, C>,
    config: HttpServerConfig,
}

impl<R, C> HttpServer<R, C>
where
    R: OrderRepository,
    C: Catalog,
{
    pub async fn new(service: OrderService<R, C>, config: HttpServerConfig) -> anyhow::Result<Self> {
        let state = AppState {
            service: Arc::new(service),
            verifier: TokenVerifier::new(config.auth_secret.clone()),
        };
        Ok(Self { state, config })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let app = Router::new()
            .route("/health", get(health))
            .route("/orders", post(create_order::<R, C>))
            .route("/orders", get(list_all_orders::<R, C>))
            .route("/orders/mine", get(list_my_orders::<R, C>))
            .route("/orders/{id}", get(get_order::<R, C>))
            .route("/orders/{id}", put(update_order::<R, C>))
            .route("/orders/{id}", delete(delete_order::<R, C>))
            .route("/products", get(list_products::<R, C>))
            .route("/products/{id}", get(get_product::<R, C>))
            .layer(trace_layer)
            .with_state(self.state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|e| AppError::Validation(e.to_string()))
}

async fn create_order<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    CallerIdentity(identity): CallerIdentity,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<Order>), AppError> {
    let order = service.create_order(identity, payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(order)))
}

async fn get_order<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = service.get_order(identity, parse_id(&id)?).await?;
    Ok(Json(order))
}

async fn list_my_orders<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<Json<Vec<Order>>, AppError> {
    let list = service.list_my_orders(identity).await?;
    Ok(Json(list))
}

async fn list_all_orders<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<Json<Vec<Order>>, AppError> {
    let list = service.list_all_orders(identity).await?;
    Ok(Json(list))
}

async fn update_order<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<String>,
    Json(payload): Json<AdminOrderUpdate>,
) -> Result<Json<Order>, AppError> {
    let updated = service.update_order(identity, parse_id(&id)?, payload).await?;
    Ok(Json(updated))
}

async fn delete_order<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, AppError> {
    service.delete_order(identity, parse_id(&id)?).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct ProductListQuery {
    /// Comma-separated id list for the cart enrichment batch fetch.
    ids: Option<String>,
}

async fn list_products<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = match query.ids {
        Some(raw) => {
            let ids = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(parse_id)
                .collect::<Result<Vec<_>, _>>()?;
            service.list_products(Some(&ids)).await?
        }
        None => service.list_products(None).await?,
    };
    Ok(Json(products))
}

async fn get_product<R: OrderRepository, C: Catalog>(
    State(service): State<Arc<OrderService<R, C>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = service.get_product(parse_id(&id)?).await?;
    Ok(Json(product))
}
