use crate::{
    db::DbPool,
    entities::{invoice, invoice::InvoiceStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub amount: Decimal,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    pub customer_name: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InvoiceService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<invoice::Model>, u64), ServiceError> {
        let mut query = invoice::Entity::find();
        if let Some(status_filter) = status {
            if let Ok(parsed) = status_filter.parse::<InvoiceStatus>() {
                query = query.filter(invoice::Column::Status.eq(parsed));
            } else {
                return Ok((vec![], 0));
            }
        }

        let paginator = query
            .order_by_desc(invoice::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page - 1).await?;
        Ok((invoices, total))
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: Uuid) -> Result<Option<invoice::Model>, ServiceError> {
        let found = invoice::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    /// Creates an invoice; the invoice number must be unused.
    #[instrument(skip(self))]
    pub async fn create_invoice(
        &self,
        input: CreateInvoiceInput,
    ) -> Result<invoice::Model, ServiceError> {
        let existing = invoice::Entity::find()
            .filter(invoice::Column::InvoiceNumber.eq(input.invoice_number.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Invoice number '{}' already exists",
                input.invoice_number
            )));
        }

        let model = invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(input.invoice_number),
            customer_id: Set(input.customer_id),
            customer_name: Set(input.customer_name),
            amount: Set(input.amount),
            status: Set(input.status.unwrap_or(InvoiceStatus::Draft)),
            due_date: Set(input.due_date),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::InvoiceCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_invoice(
        &self,
        id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<invoice::Model, ServiceError> {
        let model = invoice::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", id)))?;

        let mut active: invoice::ActiveModel = model.into();
        if let Some(customer_name) = input.customer_name {
            active.customer_name = Set(customer_name);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(Some(due_date));
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::InvoiceUpdated(updated.id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = invoice::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Invoice {} not found", id)));
        }
        Ok(())
    }
}
