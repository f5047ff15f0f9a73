//! REST API router for the store.
//!
//! Used by the binary and by integration tests. Build state with [`AppState::open`] and
//! the router with [`create_router`]. State travels in an `Extension`, so the router is
//! `Router<()>` and works with `into_make_service()`.
//!
//! Every response body is an envelope: `{ data }`, `{ message, data? }` or `{ error }`.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::carts::CartBook;
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::id_gen::IdGenerator;
use crate::persistence::JsonStore;
use crate::products::ProductCatalog;
use crate::types::whole_quantity;

/// Shared app state: one product catalog and one cart book per process.
#[derive(Clone)]
pub struct AppState {
    pub(crate) products: Arc<ProductCatalog>,
    pub(crate) carts: Arc<CartBook>,
}

impl AppState {
    pub fn new(products: ProductCatalog, carts: CartBook) -> Self {
        Self {
            products: Arc::new(products),
            carts: Arc::new(carts),
        }
    }

    /// Creates any missing collection file as `[]`, then loads the product catalog.
    pub async fn open(config: &AppConfig) -> Result<Self, StoreError> {
        let product_store = JsonStore::new(&config.products_path);
        let cart_store = JsonStore::new(&config.carts_path);
        for store in [&product_store, &cart_store] {
            if store.ensure_exists().await? {
                info!("created empty collection file path={}", store.path().display());
            }
        }
        let products = ProductCatalog::load(product_store, IdGenerator::new()).await?;
        let carts = CartBook::new(cart_store, IdGenerator::new());
        Ok(Self::new(products, carts))
    }
}

/// Builds the REST router with state.
pub fn create_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/products",
            get(list_products).post(create_product).fallback(method_not_allowed),
        )
        .route(
            "/api/products/:id",
            get(get_product)
                .put(update_product)
                .delete(delete_product)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/carts",
            get(list_carts).post(create_cart).fallback(method_not_allowed),
        )
        .route(
            "/api/carts/:id",
            get(get_cart_products).fallback(method_not_allowed),
        )
        .route(
            "/api/carts/:id/product/:pid",
            post(add_product_to_cart)
                .delete(remove_product_from_cart)
                .fallback(method_not_allowed),
        )
        .fallback(route_not_found)
        .layer(Extension(state))
        .layer(CatchPanicLayer::custom(handle_panic))
}

#[derive(Serialize)]
struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

fn data<T: Serialize>(data: T) -> Response {
    Json(Envelope {
        message: None,
        data: Some(data),
    })
    .into_response()
}

fn message_with_data<T: Serialize>(status: StatusCode, message: &'static str, data: T) -> Response {
    (
        status,
        Json(Envelope {
            message: Some(message),
            data: Some(data),
        }),
    )
        .into_response()
}

fn message(message: &'static str) -> Response {
    Json(Envelope::<()> {
        message: Some(message),
        data: None,
    })
    .into_response()
}

fn error_body(status: StatusCode, error: &str) -> Response {
    (status, Json(serde_json::json!({ "error": error }))).into_response()
}

fn is_blank(body: &Bytes) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

fn parse_json(body: &Bytes) -> Result<Value, StoreError> {
    serde_json::from_slice(body).map_err(|e| StoreError::InvalidInput(format!("malformed JSON body: {}", e)))
}

/// Like [`parse_json`], but an empty body reads as `{}`.
fn parse_json_or_empty(body: &Bytes) -> Result<Value, StoreError> {
    if is_blank(body) {
        return Ok(Value::Object(Default::default()));
    }
    parse_json(body)
}

/// Add-to-cart quantity. Empty body, missing key, `null` and `0` all mean 1. A whole float
/// such as `2.0` is read as that integer.
fn quantity_from_body(body: &Bytes) -> Result<u64, StoreError> {
    if is_blank(body) {
        return Ok(1);
    }
    let value = parse_json(body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::InvalidInput("body must be a JSON object".into()))?;
    match obj.get("quantity") {
        None | Some(Value::Null) => Ok(1),
        Some(v) => match whole_quantity(v) {
            Some(0) => Ok(1),
            Some(q) => Ok(q),
            None => Err(StoreError::InvalidInput(
                "`quantity` must be a positive integer".into(),
            )),
        },
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn route_not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "route not found")
}

async fn method_not_allowed() -> Response {
    error_body(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("handler panicked detail={}", detail);
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "something went wrong")
}

async fn list_products(Extension(state): Extension<AppState>) -> Response {
    data(state.products.list_all().await)
}

async fn get_product(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StoreError> {
    Ok(data(state.products.get_by_id(&id).await?))
}

async fn create_product(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> Result<Response, StoreError> {
    let payload = parse_json(&body)?;
    let product = state.products.create(&payload).await?;
    Ok(message_with_data(StatusCode::CREATED, "product created", product))
}

async fn update_product(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, StoreError> {
    let payload = parse_json_or_empty(&body)?;
    let product = state.products.update(&id, &payload).await?;
    Ok(message_with_data(StatusCode::OK, "product updated", product))
}

async fn delete_product(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StoreError> {
    state.products.delete(&id).await?;
    Ok(message("product deleted"))
}

async fn list_carts(Extension(state): Extension<AppState>) -> Result<Response, StoreError> {
    Ok(data(state.carts.list_all().await?))
}

async fn create_cart(Extension(state): Extension<AppState>) -> Result<Response, StoreError> {
    let cart = state.carts.create().await?;
    Ok(message_with_data(StatusCode::CREATED, "cart created", cart))
}

async fn get_cart_products(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StoreError> {
    Ok(data(state.carts.get_products(&id).await?))
}

async fn add_product_to_cart(
    Extension(state): Extension<AppState>,
    Path((cart_id, product_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, StoreError> {
    let quantity = quantity_from_body(&body)?;
    let products = state.carts.add_product(&cart_id, &product_id, quantity).await?;
    Ok(message_with_data(StatusCode::OK, "product added to cart", products))
}

async fn remove_product_from_cart(
    Extension(state): Extension<AppState>,
    Path((cart_id, product_id)): Path<(String, String)>,
) -> Result<Response, StoreError> {
    state.carts.remove_product(&cart_id, &product_id).await?;
    Ok(message("product removed from cart"))
}
