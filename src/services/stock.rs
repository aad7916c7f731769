use crate::{
    db::DbPool,
    entities::{product, stock_item},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateStockItemInput {
    pub product_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub location: String,
    pub supplier: String,
    pub batch_number: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStockItemInput {
    pub item_name: Option<String>,
    pub quantity: Option<i32>,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
}

/// Service owning the `stock_items` table. All quantity mutation goes
/// through here: direct edits via `update_stock`, dispatch decrements via
/// `decrement_quantity`.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        page: u64,
        limit: u64,
        location: Option<String>,
    ) -> Result<(Vec<stock_item::Model>, u64), ServiceError> {
        let mut query = stock_item::Entity::find();

        if let Some(loc) = location.filter(|s| !s.trim().is_empty()) {
            query = query.filter(stock_item::Column::Location.eq(loc.trim().to_string()));
        }

        let paginator = query
            .order_by_asc(stock_item::Column::ItemName)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_stock(&self, id: Uuid) -> Result<Option<stock_item::Model>, ServiceError> {
        let found = stock_item::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    /// Stock items at or below the given quantity threshold.
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<stock_item::Model>, ServiceError> {
        let items = stock_item::Entity::find()
            .filter(stock_item::Column::Quantity.lte(threshold))
            .order_by_asc(stock_item::Column::Quantity)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    /// Creates a stock item. The referenced product must exist.
    #[instrument(skip(self))]
    pub async fn create_stock(
        &self,
        input: CreateStockItemInput,
    ) -> Result<stock_item::Model, ServiceError> {
        let product = product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?;
        if product.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Product {} does not exist",
                input.product_id
            )));
        }

        if input.quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let model = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            item_name: Set(input.item_name),
            quantity: Set(input.quantity),
            location: Set(input.location),
            supplier: Set(input.supplier),
            batch_number: Set(input.batch_number),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::StockCreated(created.id))
            .await;
        Ok(created)
    }

    /// Updates a stock item. A negative quantity is rejected before
    /// anything reaches the store.
    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        id: Uuid,
        input: UpdateStockItemInput,
    ) -> Result<stock_item::Model, ServiceError> {
        if let Some(quantity) = input.quantity {
            if quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "Quantity cannot be negative".to_string(),
                ));
            }
        }

        let model = stock_item::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", id)))?;
        let old_quantity = model.quantity;

        let mut active: stock_item::ActiveModel = model.into();
        if let Some(item_name) = input.item_name {
            active.item_name = Set(item_name);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if let Some(supplier) = input.supplier {
            active.supplier = Set(supplier);
        }
        if let Some(batch_number) = input.batch_number {
            active.batch_number = Set(Some(batch_number));
        }

        let updated = active.update(&*self.db).await?;
        if updated.quantity != old_quantity {
            self.event_sender
                .send_or_log(Event::StockAdjusted {
                    stock_id: updated.id,
                    old_quantity,
                    new_quantity: updated.quantity,
                })
                .await;
        }
        Ok(updated)
    }

    /// Atomically decrements the on-hand quantity, conditional on enough
    /// stock being present. This is a single
    /// `SET quantity = quantity - n WHERE id = ? AND quantity >= n`
    /// statement, so two concurrent decrements can never drive the
    /// quantity negative.
    #[instrument(skip(self))]
    pub async fn decrement_quantity(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<stock_item::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Decrement quantity must be positive".to_string(),
            ));
        }

        let result = stock_item::Entity::update_many()
            .col_expr(
                stock_item::Column::Quantity,
                Expr::col(stock_item::Column::Quantity).sub(quantity),
            )
            .col_expr(stock_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stock_item::Column::Id.eq(id))
            .filter(stock_item::Column::Quantity.gte(quantity))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            // Either the row is gone or the condition failed; look to tell
            // the caller which.
            return match self.get_stock(id).await? {
                Some(current) => Err(ServiceError::InsufficientStock(format!(
                    "requested {} but only {} available for '{}'",
                    quantity, current.quantity, current.item_name
                ))),
                None => Err(ServiceError::NotFound(format!(
                    "Stock item {} not found",
                    id
                ))),
            };
        }

        let updated = self
            .get_stock(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", id)))?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                stock_id: updated.id,
                old_quantity: updated.quantity + quantity,
                new_quantity: updated.quantity,
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_stock(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = stock_item::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Stock item {} not found",
                id
            )));
        }
        self.event_sender.send_or_log(Event::StockDeleted(id)).await;
        Ok(())
    }
}
