use crate::{
    entities::{order, order::OrderStatus},
    errors::ServiceError,
    services::orders::{CreateOrderInput, UpdateOrderInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Default)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub status: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            status: model.status.to_string(),
            total_amount: model.total_amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub order_number: String,
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    pub total_amount: Decimal,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
}

fn parse_status(value: Option<String>) -> Result<Option<OrderStatus>, ServiceError> {
    value
        .map(|s| s.parse::<OrderStatus>().map_err(ServiceError::ValidationError))
        .transpose()
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<OrderResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state
        .services
        .orders
        .list_orders(page, limit, query.status)
        .await?;
    let items: Vec<OrderResponse> = records.into_iter().map(OrderResponse::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    match state.services.orders.get_order(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(OrderResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!("Order {} not found", id))),
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = parse_status(payload.status)?;
    let created = state
        .services
        .orders
        .create_order(CreateOrderInput {
            order_number: payload.order_number,
            customer_id: payload.customer_id,
            customer_name: payload.customer_name,
            total_amount: payload.total_amount,
            status,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(OrderResponse::from(created))),
    ))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> ApiResult<OrderResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = parse_status(payload.status)?;
    let updated = state
        .services
        .orders
        .update_order(
            id,
            UpdateOrderInput {
                customer_name: payload.customer_name,
                total_amount: payload.total_amount,
                status,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(OrderResponse::from(updated))))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
