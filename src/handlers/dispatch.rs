use crate::{
    entities::dispatch_record,
    errors::ServiceError,
    handlers::shipments::ShipmentResponse,
    handlers::stock::StockItemResponse,
    services::dispatch::DispatchStockCommand,
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
pub struct DispatchListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "dispatch_id": "DSP-1723026000123-4821",
    "stock_id": "7c0e8400-e29b-41d4-a716-446655440000",
    "item_name": "M8 hex bolts (box of 100)",
    "dispatched_quantity": 30,
    "invoice_id": "110e8400-e29b-41d4-a716-446655440000",
    "customer_id": "220e8400-e29b-41d4-a716-446655440000",
    "customer_name": "Acme Hardware",
    "shipment_id": "990e8400-e29b-41d4-a716-446655440000",
    "status": "Pending",
    "dispatch_date": "2024-12-09T10:30:00Z",
    "notes": null,
    "created_at": "2024-12-09T10:30:00Z"
}))]
pub struct DispatchRecordResponse {
    pub dispatch_id: String,
    pub stock_id: Uuid,
    pub item_name: String,
    pub dispatched_quantity: i32,
    pub invoice_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub shipment_id: Option<Uuid>,
    /// Dispatch record status (Pending, In Transit, Delivered)
    pub status: String,
    pub dispatch_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<dispatch_record::Model> for DispatchRecordResponse {
    fn from(model: dispatch_record::Model) -> Self {
        Self {
            dispatch_id: model.dispatch_id,
            stock_id: model.stock_id,
            item_name: model.item_name,
            dispatched_quantity: model.dispatched_quantity,
            invoice_id: model.invoice_id,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            shipment_id: model.shipment_id,
            status: model.status.to_string(),
            dispatch_date: model.dispatch_date,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// Request body for the dispatch workflow. Every field the workflow needs
/// is explicit; unknown availability or an inactive courier is caught
/// server-side before any write.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "stock_id": "7c0e8400-e29b-41d4-a716-446655440000",
    "dispatch_quantity": 30,
    "invoice_id": "110e8400-e29b-41d4-a716-446655440000",
    "customer_id": "220e8400-e29b-41d4-a716-446655440000",
    "customer_name": "Acme Hardware",
    "courier_id": "330e8400-e29b-41d4-a716-446655440000",
    "customer_phone": "+44 20 7946 0000",
    "customer_address": "12 Harbour Road, Bristol",
    "estimated_delivery": "2024-12-12T18:00:00Z",
    "notes": "leave at reception"
}))]
pub struct DispatchRequest {
    pub stock_id: Uuid,
    #[validate(range(min = 1, message = "Dispatch quantity must be positive"))]
    pub dispatch_quantity: i32,
    pub invoice_id: Uuid,
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    pub courier_id: Uuid,
    #[validate(length(min = 1, message = "Customer phone is required"))]
    pub customer_phone: String,
    #[validate(length(min = 1, message = "Customer address is required"))]
    pub customer_address: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Everything a successful dispatch produced: the reduced stock item, the
/// new shipment (with tracking number), and the dispatch record linking
/// the two.
#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchResponse {
    pub stock_item: StockItemResponse,
    pub shipment: ShipmentResponse,
    pub dispatch_record: DispatchRecordResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "status": "In Transit", "notes": "handed to courier" }))]
pub struct UpdateDispatchStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub notes: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/dispatch",
    request_body = DispatchRequest,
    responses(
        (status = 201, description = "Stock dispatched", body = ApiResponse<DispatchResponse>),
        (status = 400, description = "Invalid request or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Stock item or courier not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Dispatch failed, possibly partially", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn dispatch_stock(
    State(state): State<AppState>,
    Json(payload): Json<DispatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let command = DispatchStockCommand {
        stock_id: payload.stock_id,
        dispatch_quantity: payload.dispatch_quantity,
        invoice_id: payload.invoice_id,
        customer_id: payload.customer_id,
        customer_name: payload.customer_name,
        courier_id: payload.courier_id,
        customer_phone: payload.customer_phone,
        customer_address: payload.customer_address,
        estimated_delivery: payload.estimated_delivery,
        notes: payload.notes,
    };

    let outcome = state.services.dispatch.dispatch_stock(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(DispatchResponse {
            stock_item: StockItemResponse::from(outcome.stock_item),
            shipment: ShipmentResponse::from(outcome.shipment),
            dispatch_record: DispatchRecordResponse::from(outcome.dispatch_record),
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispatch",
    params(DispatchListQuery),
    responses(
        (status = 200, description = "Dispatch records listed", body = ApiResponse<PaginatedResponse<DispatchRecordResponse>>)
    ),
    tag = "dispatch"
)]
pub async fn list_dispatches(
    State(state): State<AppState>,
    Query(query): Query<DispatchListQuery>,
) -> ApiResult<PaginatedResponse<DispatchRecordResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state
        .services
        .dispatch
        .list_dispatches(page, limit, query.status)
        .await?;

    let items: Vec<DispatchRecordResponse> = records
        .into_iter()
        .map(DispatchRecordResponse::from)
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

#[utoipa::path(
    get,
    path = "/api/v1/dispatch/:dispatch_id",
    params(("dispatch_id" = String, Path, description = "Dispatch record ID")),
    responses(
        (status = 200, description = "Dispatch record fetched", body = ApiResponse<DispatchRecordResponse>),
        (status = 404, description = "Dispatch record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn get_dispatch(
    State(state): State<AppState>,
    Path(dispatch_id): Path<String>,
) -> ApiResult<DispatchRecordResponse> {
    match state.services.dispatch.get_dispatch(&dispatch_id).await? {
        Some(model) => Ok(Json(ApiResponse::success(DispatchRecordResponse::from(
            model,
        )))),
        None => Err(ServiceError::NotFound(format!(
            "Dispatch record {} not found",
            dispatch_id
        ))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/dispatch/:dispatch_id/status",
    params(("dispatch_id" = String, Path, description = "Dispatch record ID")),
    request_body = UpdateDispatchStatusRequest,
    responses(
        (status = 200, description = "Dispatch status updated", body = ApiResponse<DispatchRecordResponse>),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Dispatch record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn update_dispatch_status(
    State(state): State<AppState>,
    Path(dispatch_id): Path<String>,
    Json(payload): Json<UpdateDispatchStatusRequest>,
) -> ApiResult<DispatchRecordResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = payload
        .status
        .parse::<dispatch_record::DispatchStatus>()
        .map_err(ServiceError::ValidationError)?;

    let updated = state
        .services
        .dispatch
        .update_status(&dispatch_id, status, payload.notes)
        .await?;

    Ok(Json(ApiResponse::success(DispatchRecordResponse::from(
        updated,
    ))))
}
