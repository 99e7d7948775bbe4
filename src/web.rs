//! HTTP API for the grocery catalog
//!
//! Maps REST endpoints onto [`CatalogService`] calls and catalog errors onto
//! status codes. Blank search terms and oversized page limits are handled
//! here; everything else is decided by the service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::error::CatalogError;
use crate::models::{
    NewProduct, NewStore, Product, ProductUpdate, ProductWithStore, Store, StoreUpdate,
    StoreWithProducts,
};
use crate::service::{CatalogService, PriceComparisonResponse, SearchResponse};

/// Largest page a single list request may return
pub const MAX_LIMIT: usize = 1000;

/// Shared application state
#[derive(Clone)]
struct AppState {
    catalog: CatalogService,
}

/// Offset/limit query parameters
#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

impl Pagination {
    fn limit(&self) -> usize {
        self.limit.min(MAX_LIMIT)
    }
}

/// Search query parameters
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    product_name: String,
}

#[derive(Debug, Deserialize)]
struct StoreIdParam {
    store_id: i64,
}

/// Error body: `{"detail": "..."}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Failure of an API call
#[derive(Debug)]
enum ApiError {
    Catalog(CatalogError),
    /// Request rejected before reaching the catalog
    Unprocessable(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
            // Only reaches here if the service let an empty comparison through
            ApiError::Catalog(CatalogError::EmptyInput) => StatusCode::NOT_FOUND,
            ApiError::Catalog(CatalogError::DuplicateKey { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(CatalogError::InvalidValue { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Catalog(err) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                log::error!("Catalog error: {}", err);
                "Internal server error".to_string()
            }
            ApiError::Catalog(err) => err.to_string(),
            ApiError::Unprocessable(msg) => msg.clone(),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn require_text(name: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Unprocessable(format!("{} must not be blank", name)));
    }
    Ok(())
}

/// GET / - API information
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to the Grocery Price Checker API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

// ── Stores ─────────────────────────────────────────────────────────────────

/// POST /api/stores
async fn create_store_handler(
    State(state): State<AppState>,
    Json(new_store): Json<NewStore>,
) -> ApiResult<(StatusCode, Json<Store>)> {
    let store = state.catalog.create_store(&new_store)?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// GET /api/stores?skip={skip}&limit={limit}
async fn list_stores_handler(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Store>>> {
    Ok(Json(state.catalog.list_stores(page.skip, page.limit())?))
}

/// GET /api/stores/{id}
async fn get_store_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StoreWithProducts>> {
    Ok(Json(state.catalog.get_store(id)?))
}

/// PUT /api/stores/{id}
async fn update_store_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StoreUpdate>,
) -> ApiResult<Json<Store>> {
    Ok(Json(state.catalog.update_store(id, &update)?))
}

/// DELETE /api/stores/{id}
async fn delete_store_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_store(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stores/{id}/products?skip={skip}&limit={limit}
async fn store_products_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<ProductWithStore>>> {
    Ok(Json(state.catalog.list_products_by_store(
        id,
        page.skip,
        page.limit(),
    )?))
}

// ── Products ───────────────────────────────────────────────────────────────

/// POST /api/products?store_id={id}
async fn create_product_handler(
    State(state): State<AppState>,
    Query(params): Query<StoreIdParam>,
    Json(new_product): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state
        .catalog
        .create_product_for_store(params.store_id, &new_product)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products?skip={skip}&limit={limit}
async fn list_products_handler(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<ProductWithStore>>> {
    Ok(Json(state.catalog.list_products(page.skip, page.limit())?))
}

/// GET /api/products/search?q={query}&skip={skip}&limit={limit}
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    require_text("q", &params.q)?;
    let limit = params.limit.min(MAX_LIMIT);
    Ok(Json(state.catalog.search_products(
        &params.q,
        params.skip,
        limit,
    )?))
}

/// GET /api/products/compare?product_name={name}
async fn compare_handler(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> ApiResult<Json<PriceComparisonResponse>> {
    require_text("product_name", &params.product_name)?;
    Ok(Json(
        state.catalog.compare_product_prices(&params.product_name)?,
    ))
}

/// GET /api/products/{id}
async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductWithStore>> {
    Ok(Json(state.catalog.get_product(id)?))
}

/// PUT /api/products/{id}
async fn update_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.catalog.update_product(id, &update)?))
}

/// DELETE /api/products/{id}
async fn delete_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_product(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build the web server router
pub fn create_router(catalog: CatalogService) -> Router {
    let state = AppState { catalog };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/stores",
            get(list_stores_handler).post(create_store_handler),
        )
        .route(
            "/api/stores/{id}",
            get(get_store_handler)
                .put(update_store_handler)
                .delete(delete_store_handler),
        )
        .route("/api/stores/{id}/products", get(store_products_handler))
        .route(
            "/api/products",
            get(list_products_handler).post(create_product_handler),
        )
        .route("/api/products/search", get(search_handler))
        .route("/api/products/compare", get(compare_handler))
        .route(
            "/api/products/{id}",
            get(get_product_handler)
                .put(update_product_handler)
                .delete(delete_product_handler),
        )
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// Start the web server and run until Ctrl+C
pub async fn serve(catalog: CatalogService, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_router(catalog);

    log::info!("Catalog API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Catalog API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
