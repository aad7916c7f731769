use crate::{
    db::DbPool,
    entities::{purchase_order, purchase_order::PurchaseOrderStatus},
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
pub struct CreatePurchaseOrderInput {
    pub po_number: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub total_amount: Decimal,
    pub status: Option<PurchaseOrderStatus>,
    pub expected_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePurchaseOrderInput {
    pub supplier_name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: Option<PurchaseOrderStatus>,
    pub expected_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let mut query = purchase_order::Entity::find();
        if let Some(status_filter) = status {
            if let Ok(parsed) = status_filter.parse::<PurchaseOrderStatus>() {
                query = query.filter(purchase_order::Column::Status.eq(parsed));
            } else {
                return Ok((vec![], 0));
            }
        }

        let paginator = query
            .order_by_desc(purchase_order::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok((orders, total))
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        id: Uuid,
    ) -> Result<Option<purchase_order::Model>, ServiceError> {
        let found = purchase_order::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    /// Creates a purchase order; the PO number must be unused.
    #[instrument(skip(self))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<purchase_order::Model, ServiceError> {
        let existing = purchase_order::Entity::find()
            .filter(purchase_order::Column::PoNumber.eq(input.po_number.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Purchase order number '{}' already exists",
                input.po_number
            )));
        }

        let model = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            po_number: Set(input.po_number),
            supplier_id: Set(input.supplier_id),
            supplier_name: Set(input.supplier_name),
            status: Set(input.status.unwrap_or(PurchaseOrderStatus::Draft)),
            total_amount: Set(input.total_amount),
            expected_date: Set(input.expected_date),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::PurchaseOrderCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_purchase_order(
        &self,
        id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> Result<purchase_order::Model, ServiceError> {
        let model = purchase_order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))?;

        let mut active: purchase_order::ActiveModel = model.into();
        if let Some(supplier_name) = input.supplier_name {
            active.supplier_name = Set(supplier_name);
        }
        if let Some(total_amount) = input.total_amount {
            active.total_amount = Set(total_amount);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(expected_date) = input.expected_date {
            active.expected_date = Set(Some(expected_date));
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::PurchaseOrderUpdated(updated.id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = purchase_order::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Purchase order {} not found",
                id
            )));
        }
        Ok(())
    }
}
