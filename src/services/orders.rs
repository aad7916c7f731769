use crate::{
    db::DbPool,
    entities::{order, order::OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub total_amount: Decimal,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrderInput {
    pub customer_name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: Option<OrderStatus>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find();
        if let Some(status_filter) = status {
            if let Ok(parsed) = status_filter.parse::<OrderStatus>() {
                query = query.filter(order::Column::Status.eq(parsed));
            } else {
                return Ok((vec![], 0));
            }
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok((orders, total))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        let found = order::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    /// Creates an order; the order number must be unused.
    #[instrument(skip(self))]
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<order::Model, ServiceError> {
        let existing = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(input.order_number.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Order number '{}' already exists",
                input.order_number
            )));
        }

        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(input.order_number),
            customer_id: Set(input.customer_id),
            customer_name: Set(input.customer_name),
            status: Set(input.status.unwrap_or(OrderStatus::Pending)),
            total_amount: Set(input.total_amount),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::OrderCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_order(
        &self,
        id: Uuid,
        input: UpdateOrderInput,
    ) -> Result<order::Model, ServiceError> {
        let model = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut active: order::ActiveModel = model.into();
        if let Some(customer_name) = input.customer_name {
            active.customer_name = Set(customer_name);
        }
        if let Some(total_amount) = input.total_amount {
            active.total_amount = Set(total_amount);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::OrderUpdated(updated.id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = order::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Order {} not found", id)));
        }
        Ok(())
    }
}
