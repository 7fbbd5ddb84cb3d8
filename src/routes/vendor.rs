use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    error::AppResult,
    models::{Product, Session},
    notice::Notices,
    response::{ApiResponse, Meta},
    services::inventory_service::{InventoryManager, ProductForm},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
}

async fn open_inventory(state: &AppState, session: &Session) -> AppResult<InventoryManager> {
    InventoryManager::open(
        Some(session),
        state.platform.roles.as_ref(),
        state.products.clone(),
        Notices::detached(),
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/vendor/products",
    responses(
        (status = 200, description = "The vendor's products", body = ApiResponse<ProductList>),
        (status = 403, description = "Not a vendor"),
    ),
    tag = "Vendor"
)]
pub async fn list_products(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let inventory = open_inventory(&state, &session).await?;
    let items = inventory.list_products().await?;
    let meta = Meta::total(items.len());
    Ok(Json(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/api/vendor/products",
    request_body = ProductForm,
    responses(
        (status = 200, description = "Created product", body = ApiResponse<Product>),
        (status = 422, description = "Invalid product form"),
    ),
    tag = "Vendor"
)]
pub async fn create_product(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ProductForm>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let inventory = open_inventory(&state, &session).await?;
    let product = inventory.create_product(&form).await?;
    Ok(Json(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/vendor/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ProductForm,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid product form"),
    ),
    tag = "Vendor"
)]
pub async fn update_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(form): Json<ProductForm>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let inventory = open_inventory(&state, &session).await?;
    let product = inventory.update_product(id, &form).await?;
    Ok(Json(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/vendor/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Vendor"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let inventory = open_inventory(&state, &session).await?;
    inventory.delete_product(id).await?;
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
