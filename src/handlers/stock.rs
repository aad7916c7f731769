use crate::{
    entities::stock_item,
    errors::ServiceError,
    services::stock::{CreateStockItemInput, UpdateStockItemInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Quantity at or below which an item counts as low stock; defaults to
    /// the configured threshold.
    pub threshold: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "7c0e8400-e29b-41d4-a716-446655440000",
    "product_id": "550e8400-e29b-41d4-a716-446655440000",
    "item_name": "M8 hex bolts (box of 100)",
    "quantity": 70,
    "location": "Aisle 4, Shelf B",
    "supplier": "Fastenal",
    "batch_number": "B-2219",
    "created_at": "2024-11-02T10:30:00Z",
    "updated_at": "2024-12-09T14:30:00Z"
}))]
pub struct StockItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub location: String,
    pub supplier: String,
    pub batch_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<stock_item::Model> for StockItemResponse {
    fn from(model: stock_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            item_name: model.item_name,
            quantity: model.quantity,
            location: model.location,
            supplier: model.supplier,
            batch_number: model.batch_number,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "product_id": "550e8400-e29b-41d4-a716-446655440000",
    "item_name": "M8 hex bolts (box of 100)",
    "quantity": 100,
    "location": "Aisle 4, Shelf B",
    "supplier": "Fastenal",
    "batch_number": "B-2219"
}))]
pub struct CreateStockItemRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub item_name: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(length(min = 1, max = 255))]
    pub supplier: String,
    pub batch_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStockItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub item_name: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock items listed", body = ApiResponse<PaginatedResponse<StockItemResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> ApiResult<PaginatedResponse<StockItemResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state
        .services
        .stock
        .list_stock(page, limit, query.location)
        .await?;

    let items: Vec<StockItemResponse> = records.into_iter().map(StockItemResponse::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock/low",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Low stock items", body = ApiResponse<Vec<StockItemResponse>>)
    ),
    tag = "stock"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<Vec<StockItemResponse>> {
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    let records = state.services.stock.low_stock(threshold).await?;
    let items: Vec<StockItemResponse> = records.into_iter().map(StockItemResponse::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock/:id",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 200, description = "Stock item fetched", body = ApiResponse<StockItemResponse>),
        (status = 404, description = "Stock item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StockItemResponse> {
    match state.services.stock.get_stock(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(StockItemResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!(
            "Stock item {} not found",
            id
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/stock",
    request_body = CreateStockItemRequest,
    responses(
        (status = 201, description = "Stock item created", body = ApiResponse<StockItemResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn create_stock(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .stock
        .create_stock(CreateStockItemInput {
            product_id: payload.product_id,
            item_name: payload.item_name,
            quantity: payload.quantity,
            location: payload.location,
            supplier: payload.supplier,
            batch_number: payload.batch_number,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StockItemResponse::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/stock/:id",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    request_body = UpdateStockItemRequest,
    responses(
        (status = 200, description = "Stock item updated", body = ApiResponse<StockItemResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Stock item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockItemRequest>,
) -> ApiResult<StockItemResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .services
        .stock
        .update_stock(
            id,
            UpdateStockItemInput {
                item_name: payload.item_name,
                quantity: payload.quantity,
                location: payload.location,
                supplier: payload.supplier,
                batch_number: payload.batch_number,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(StockItemResponse::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stock/:id",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 204, description = "Stock item deleted"),
        (status = 404, description = "Stock item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn delete_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.stock.delete_stock(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
