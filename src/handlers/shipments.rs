use crate::{
    entities::shipment,
    errors::ServiceError,
    services::shipments::{CreateShipmentInput, ShipmentLine, UpdateShipmentInput},
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
pub struct ShipmentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "990e8400-e29b-41d4-a716-446655440000",
    "order_id": null,
    "courier_id": "330e8400-e29b-41d4-a716-446655440000",
    "courier_name": "Swift Couriers",
    "tracking_number": "TRK-1723026000123-4821",
    "customer_name": "Acme Hardware",
    "customer_address": "12 Harbour Road, Bristol",
    "customer_phone": "+44 20 7946 0000",
    "status": "Pending",
    "estimated_delivery": "2024-12-12T18:00:00Z",
    "pickup_date": null,
    "delivery_date": null,
    "items": [{"item_name": "M8 hex bolts (box of 100)", "quantity": 30}],
    "created_at": "2024-12-09T10:30:00Z",
    "updated_at": "2024-12-09T10:30:00Z"
}))]
pub struct ShipmentResponse {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub courier_id: Uuid,
    pub courier_name: String,
    pub tracking_number: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    /// Shipment status (Pending, Picked Up, In Transit, Out for Delivery, Delivered)
    pub status: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    /// Shipped lines as `[{ "item_name": ..., "quantity": ... }]`
    pub items: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<shipment::Model> for ShipmentResponse {
    fn from(model: shipment::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            courier_id: model.courier_id,
            courier_name: model.courier_name,
            tracking_number: model.tracking_number,
            customer_name: model.customer_name,
            customer_address: model.customer_address,
            customer_phone: model.customer_phone,
            status: model.status.to_string(),
            estimated_delivery: model.estimated_delivery,
            pickup_date: model.pickup_date,
            delivery_date: model.delivery_date,
            items: model.items,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "courier_id": "330e8400-e29b-41d4-a716-446655440000",
    "customer_name": "Acme Hardware",
    "customer_address": "12 Harbour Road, Bristol",
    "customer_phone": "+44 20 7946 0000",
    "estimated_delivery": "2024-12-12T18:00:00Z",
    "items": [{"item_name": "M8 hex bolts (box of 100)", "quantity": 30}]
}))]
pub struct CreateShipmentRequest {
    pub order_id: Option<Uuid>,
    pub courier_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 500))]
    pub customer_address: String,
    #[validate(length(min = 1, max = 50))]
    pub customer_phone: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<ShipmentLineRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShipmentLineRequest {
    #[validate(length(min = 1, max = 255))]
    pub item_name: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateShipmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub customer_address: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub customer_phone: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "status": "Delivered" }))]
pub struct UpdateShipmentStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    /// Optional explicit delivery date; when omitted and the status moves
    /// to Delivered, today is stamped automatically.
    pub delivery_date: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    params(ShipmentListQuery),
    responses(
        (status = 200, description = "Shipments listed", body = ApiResponse<PaginatedResponse<ShipmentResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ShipmentListQuery>,
) -> ApiResult<PaginatedResponse<ShipmentResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state
        .services
        .shipments
        .list_shipments(page, limit, query.status)
        .await?;

    let items: Vec<ShipmentResponse> = records.into_iter().map(ShipmentResponse::from).collect();
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
    path = "/api/v1/shipments/:id",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment fetched", body = ApiResponse<ShipmentResponse>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ShipmentResponse> {
    match state.services.shipments.get_shipment(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(ShipmentResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!("Shipment {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/track/:tracking_number",
    params(("tracking_number" = String, Path, description = "Tracking number")),
    responses(
        (status = 200, description = "Shipment fetched by tracking number", body = ApiResponse<ShipmentResponse>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn track_by_number(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
) -> ApiResult<ShipmentResponse> {
    match state
        .services
        .shipments
        .find_by_tracking_number(&tracking_number)
        .await?
    {
        Some(model) => Ok(Json(ApiResponse::success(ShipmentResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!(
            "Shipment with tracking number {} not found",
            tracking_number
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ApiResponse<ShipmentResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    for line in &payload.items {
        line.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    }

    let created = state
        .services
        .shipments
        .create_shipment(CreateShipmentInput {
            order_id: payload.order_id,
            courier_id: payload.courier_id,
            customer_name: payload.customer_name,
            customer_address: payload.customer_address,
            customer_phone: payload.customer_phone,
            estimated_delivery: payload.estimated_delivery,
            items: payload
                .items
                .into_iter()
                .map(|line| ShipmentLine {
                    item_name: line.item_name,
                    quantity: line.quantity,
                })
                .collect(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ShipmentResponse::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/shipments/:id",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    request_body = UpdateShipmentRequest,
    responses(
        (status = 200, description = "Shipment updated", body = ApiResponse<ShipmentResponse>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentRequest>,
) -> ApiResult<ShipmentResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .services
        .shipments
        .update_shipment(
            id,
            UpdateShipmentInput {
                customer_name: payload.customer_name,
                customer_address: payload.customer_address,
                customer_phone: payload.customer_phone,
                estimated_delivery: payload.estimated_delivery,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(ShipmentResponse::from(updated))))
}

#[utoipa::path(
    put,
    path = "/api/v1/shipments/:id/status",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    request_body = UpdateShipmentStatusRequest,
    responses(
        (status = 200, description = "Shipment status updated", body = ApiResponse<ShipmentResponse>),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn update_shipment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentStatusRequest>,
) -> ApiResult<ShipmentResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = payload
        .status
        .parse::<shipment::ShipmentStatus>()
        .map_err(ServiceError::ValidationError)?;

    let updated = state
        .services
        .shipments
        .update_status(id, status, payload.delivery_date)
        .await?;

    Ok(Json(ApiResponse::success(ShipmentResponse::from(updated))))
}
