use crate::{
    entities::courier,
    errors::ServiceError,
    services::couriers::{CreateCourierInput, UpdateCourierInput},
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
pub struct CourierListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourierResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub pricing: Decimal,
    pub rating: Decimal,
    pub is_active: bool,
    pub service_areas: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<courier::Model> for CourierResponse {
    fn from(model: courier::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            pricing: model.pricing,
            rating: model.rating,
            is_active: model.is_active,
            service_areas: model.service_areas,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourierRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub phone: Option<String>,
    pub pricing: Decimal,
    pub rating: Option<Decimal>,
    pub is_active: Option<bool>,
    pub service_areas: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourierRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub pricing: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub is_active: Option<bool>,
    pub service_areas: Option<String>,
}

pub async fn list_couriers(
    State(state): State<AppState>,
    Query(query): Query<CourierListQuery>,
) -> ApiResult<PaginatedResponse<CourierResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state.services.couriers.list_couriers(page, limit).await?;
    let items: Vec<CourierResponse> = records.into_iter().map(CourierResponse::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Active couriers only; what the dispatch screen offers as carriers.
pub async fn list_active_couriers(
    State(state): State<AppState>,
) -> ApiResult<Vec<CourierResponse>> {
    let records = state.services.couriers.list_active().await?;
    let items: Vec<CourierResponse> = records.into_iter().map(CourierResponse::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

pub async fn get_courier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CourierResponse> {
    match state.services.couriers.get_courier(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(CourierResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!("Courier {} not found", id))),
    }
}

pub async fn create_courier(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .couriers
        .create_courier(CreateCourierInput {
            name: payload.name,
            phone: payload.phone,
            pricing: payload.pricing,
            rating: payload.rating.unwrap_or_default(),
            is_active: payload.is_active,
            service_areas: payload.service_areas,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CourierResponse::from(created))),
    ))
}

pub async fn update_courier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourierRequest>,
) -> ApiResult<CourierResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .services
        .couriers
        .update_courier(
            id,
            UpdateCourierInput {
                name: payload.name,
                phone: payload.phone,
                pricing: payload.pricing,
                rating: payload.rating,
                is_active: payload.is_active,
                service_areas: payload.service_areas,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(CourierResponse::from(updated))))
}

pub async fn delete_courier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.couriers.delete_courier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
