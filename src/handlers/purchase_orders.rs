use crate::{
    entities::{purchase_order, purchase_order::PurchaseOrderStatus},
    errors::ServiceError,
    services::purchase_orders::{CreatePurchaseOrderInput, UpdatePurchaseOrderInput},
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
pub struct PurchaseOrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseOrderResponse {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub status: String,
    pub total_amount: Decimal,
    pub expected_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<purchase_order::Model> for PurchaseOrderResponse {
    fn from(model: purchase_order::Model) -> Self {
        Self {
            id: model.id,
            po_number: model.po_number,
            supplier_id: model.supplier_id,
            supplier_name: model.supplier_name,
            status: model.status.to_string(),
            total_amount: model.total_amount,
            expected_date: model.expected_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub po_number: String,
    pub supplier_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: String,
    pub total_amount: Decimal,
    pub status: Option<String>,
    pub expected_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
    pub expected_date: Option<DateTime<Utc>>,
}

fn parse_status(value: Option<String>) -> Result<Option<PurchaseOrderStatus>, ServiceError> {
    value
        .map(|s| {
            s.parse::<PurchaseOrderStatus>()
                .map_err(ServiceError::ValidationError)
        })
        .transpose()
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
) -> ApiResult<PaginatedResponse<PurchaseOrderResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state
        .services
        .purchase_orders
        .list_purchase_orders(page, limit, query.status)
        .await?;
    let items: Vec<PurchaseOrderResponse> = records
        .into_iter()
        .map(PurchaseOrderResponse::from)
        .collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PurchaseOrderResponse> {
    match state.services.purchase_orders.get_purchase_order(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(PurchaseOrderResponse::from(
            model,
        )))),
        None => Err(ServiceError::NotFound(format!(
            "Purchase order {} not found",
            id
        ))),
    }
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = parse_status(payload.status)?;
    let created = state
        .services
        .purchase_orders
        .create_purchase_order(CreatePurchaseOrderInput {
            po_number: payload.po_number,
            supplier_id: payload.supplier_id,
            supplier_name: payload.supplier_name,
            total_amount: payload.total_amount,
            status,
            expected_date: payload.expected_date,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PurchaseOrderResponse::from(created))),
    ))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrderRequest>,
) -> ApiResult<PurchaseOrderResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = parse_status(payload.status)?;
    let updated = state
        .services
        .purchase_orders
        .update_purchase_order(
            id,
            UpdatePurchaseOrderInput {
                supplier_name: payload.supplier_name,
                total_amount: payload.total_amount,
                status,
                expected_date: payload.expected_date,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(PurchaseOrderResponse::from(
        updated,
    ))))
}

pub async fn delete_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .purchase_orders
        .delete_purchase_order(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
