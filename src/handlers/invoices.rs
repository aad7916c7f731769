use crate::{
    entities::{invoice, invoice::InvoiceStatus},
    errors::ServiceError,
    services::invoices::{CreateInvoiceInput, UpdateInvoiceInput},
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
pub struct InvoiceListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub amount: Decimal,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<invoice::Model> for InvoiceResponse {
    fn from(model: invoice::Model) -> Self {
        Self {
            id: model.id,
            invoice_number: model.invoice_number,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            amount: model.amount,
            status: model.status.to_string(),
            due_date: model.due_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, max = 100))]
    pub invoice_number: String,
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    pub amount: Decimal,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInvoiceRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

fn parse_status(value: Option<String>) -> Result<Option<InvoiceStatus>, ServiceError> {
    value
        .map(|s| s.parse::<InvoiceStatus>().map_err(ServiceError::ValidationError))
        .transpose()
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> ApiResult<PaginatedResponse<InvoiceResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (records, total) = state
        .services
        .invoices
        .list_invoices(page, limit, query.status)
        .await?;
    let items: Vec<InvoiceResponse> = records.into_iter().map(InvoiceResponse::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceResponse> {
    match state.services.invoices.get_invoice(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(InvoiceResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!("Invoice {} not found", id))),
    }
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = parse_status(payload.status)?;
    let created = state
        .services
        .invoices
        .create_invoice(CreateInvoiceInput {
            invoice_number: payload.invoice_number,
            customer_id: payload.customer_id,
            customer_name: payload.customer_name,
            amount: payload.amount,
            status,
            due_date: payload.due_date,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(InvoiceResponse::from(created))),
    ))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> ApiResult<InvoiceResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let status = parse_status(payload.status)?;
    let updated = state
        .services
        .invoices
        .update_invoice(
            id,
            UpdateInvoiceInput {
                customer_name: payload.customer_name,
                amount: payload.amount,
                status,
                due_date: payload.due_date,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(InvoiceResponse::from(updated))))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.invoices.delete_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
