//! The dispatch workflow: allocate stock against an invoice, producing a
//! shipment, an append-only dispatch record, and a reduced stock quantity.
//!
//! The three writes land in three independent tables with no enclosing
//! transaction, so the sequence runs as an explicit saga: on a step
//! failure the earlier writes are deleted again, and only when such a
//! compensating delete itself fails does the caller see a
//! `PartialWriteFailure` naming what survived.

use crate::{
    db::DbPool,
    entities::{
        courier, dispatch_record,
        dispatch_record::DispatchStatus,
        shipment,
        shipment::ShipmentStatus,
        stock_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::shipments::{generate_tracking_number, ShipmentLine},
    services::stock::StockService,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Dispatch ids keep the original time-derived human-readable shape; they
/// are printed on packing slips and read out over the phone.
pub fn generate_dispatch_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10_000);
    format!("DSP-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// A user's decision to ship a quantity of a stock item against an
/// invoice. All fields are re-validated server-side regardless of what the
/// client already checked.
#[derive(Debug, Clone, Validate)]
pub struct DispatchStockCommand {
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

/// Everything a successful dispatch produced.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub stock_item: stock_item::Model,
    pub shipment: shipment::Model,
    pub dispatch_record: dispatch_record::Model,
}

/// Writes the saga has already persisted, in execution order.
enum SagaWrite {
    Shipment(Uuid),
    DispatchRecord(String),
}

impl SagaWrite {
    fn name(&self) -> &'static str {
        match self {
            SagaWrite::Shipment(_) => "shipment",
            SagaWrite::DispatchRecord(_) => "dispatch_record",
        }
    }
}

/// Service for the dispatch workflow and dispatch history
#[derive(Clone)]
pub struct DispatchService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    stock: StockService,
}

impl DispatchService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, stock: StockService) -> Self {
        Self {
            db,
            event_sender,
            stock,
        }
    }

    /// Lists dispatch records, newest first, with an optional status
    /// filter.
    #[instrument(skip(self))]
    pub async fn list_dispatches(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<dispatch_record::Model>, u64), ServiceError> {
        let mut query = dispatch_record::Entity::find();

        if let Some(status_filter) = status {
            if let Ok(parsed) = status_filter.parse::<DispatchStatus>() {
                query = query.filter(dispatch_record::Column::Status.eq(parsed));
            } else {
                return Ok((vec![], 0));
            }
        }

        let paginator = query
            .order_by_desc(dispatch_record::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page - 1).await?;

        Ok((records, total))
    }

    #[instrument(skip(self))]
    pub async fn get_dispatch(
        &self,
        dispatch_id: &str,
    ) -> Result<Option<dispatch_record::Model>, ServiceError> {
        let found = dispatch_record::Entity::find_by_id(dispatch_id.to_string())
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    /// Updates a dispatch record's status (and optionally its notes), the
    /// only mutation the record admits. Independent of the linked
    /// shipment's status by design.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        dispatch_id: &str,
        status: DispatchStatus,
        notes: Option<String>,
    ) -> Result<dispatch_record::Model, ServiceError> {
        let model = dispatch_record::Entity::find_by_id(dispatch_id.to_string())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Dispatch record {} not found", dispatch_id))
            })?;

        let old_status = model.status;
        let mut active: dispatch_record::ActiveModel = model.into();
        active.status = Set(status);
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::DispatchStatusChanged {
                dispatch_id: updated.dispatch_id.clone(),
                old_status: old_status.to_string(),
                new_status: updated.status.to_string(),
            })
            .await;
        Ok(updated)
    }

    /// Runs the dispatch workflow.
    ///
    /// Validation happens entirely before the first write, so a rejected
    /// request is a full no-op. The three writes then run in order:
    /// shipment, dispatch record, conditional stock decrement. The
    /// decrement is atomic (`quantity = quantity - n WHERE quantity >= n`),
    /// which closes the race where two concurrent dispatches both pass the
    /// availability check and both decrement.
    #[instrument(skip(self))]
    pub async fn dispatch_stock(
        &self,
        command: DispatchStockCommand,
    ) -> Result<DispatchOutcome, ServiceError> {
        command
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        // Fresh availability check. Advisory only: the decrement re-checks
        // atomically, this just rejects hopeless requests before any write.
        let stock = stock_item::Entity::find_by_id(command.stock_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock item {} not found", command.stock_id))
            })?;
        if command.dispatch_quantity > stock.quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "requested {} but only {} available for '{}'",
                command.dispatch_quantity, stock.quantity, stock.item_name
            )));
        }

        // Couriers are re-checked here rather than trusting the
        // active-only list the client was shown.
        let courier = courier::Entity::find_by_id(command.courier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Courier {} not found", command.courier_id))
            })?;
        if !courier.is_active {
            return Err(ServiceError::ValidationError(format!(
                "Courier '{}' is not active",
                courier.name
            )));
        }

        // Step 1: shipment. Nothing to undo if this fails.
        let shipment = self.insert_shipment(&command, &stock, &courier).await?;

        // Step 2: dispatch record, linked to the step-1 shipment.
        let record = match self
            .insert_dispatch_record(&command, &stock, shipment.id)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                return Err(self
                    .compensate(vec![SagaWrite::Shipment(shipment.id)], "dispatch record", err)
                    .await);
            }
        };

        // Step 3: conditional decrement.
        let updated_stock = match self
            .stock
            .decrement_quantity(command.stock_id, command.dispatch_quantity)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                return Err(self
                    .compensate(
                        vec![
                            SagaWrite::Shipment(shipment.id),
                            SagaWrite::DispatchRecord(record.dispatch_id.clone()),
                        ],
                        "stock decrement",
                        err,
                    )
                    .await);
            }
        };

        self.event_sender
            .send_or_log(Event::StockDispatched {
                stock_id: updated_stock.id,
                dispatched_quantity: command.dispatch_quantity,
                dispatch_id: record.dispatch_id.clone(),
                shipment_id: shipment.id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::ShipmentCreated(shipment.id))
            .await;
        self.event_sender
            .send_or_log(Event::DispatchRecordCreated(record.dispatch_id.clone()))
            .await;

        Ok(DispatchOutcome {
            stock_item: updated_stock,
            shipment,
            dispatch_record: record,
        })
    }

    async fn insert_shipment(
        &self,
        command: &DispatchStockCommand,
        stock: &stock_item::Model,
        courier: &courier::Model,
    ) -> Result<shipment::Model, ServiceError> {
        let lines = vec![ShipmentLine {
            item_name: stock.item_name.clone(),
            quantity: command.dispatch_quantity,
        }];
        let items = serde_json::to_value(&lines)
            .map_err(|e| ServiceError::InternalError(format!("failed to encode items: {}", e)))?;

        let model = shipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(None),
            courier_id: Set(courier.id),
            courier_name: Set(courier.name.clone()),
            tracking_number: Set(generate_tracking_number()),
            customer_name: Set(command.customer_name.clone()),
            customer_address: Set(command.customer_address.clone()),
            customer_phone: Set(command.customer_phone.clone()),
            status: Set(ShipmentStatus::Pending),
            estimated_delivery: Set(command.estimated_delivery),
            pickup_date: Set(None),
            delivery_date: Set(None),
            items: Set(items),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        Ok(created)
    }

    async fn insert_dispatch_record(
        &self,
        command: &DispatchStockCommand,
        stock: &stock_item::Model,
        shipment_id: Uuid,
    ) -> Result<dispatch_record::Model, ServiceError> {
        let now = Utc::now();
        let model = dispatch_record::ActiveModel {
            dispatch_id: Set(generate_dispatch_id()),
            stock_id: Set(stock.id),
            item_name: Set(stock.item_name.clone()),
            dispatched_quantity: Set(command.dispatch_quantity),
            invoice_id: Set(command.invoice_id),
            customer_id: Set(command.customer_id),
            customer_name: Set(command.customer_name.clone()),
            shipment_id: Set(Some(shipment_id)),
            status: Set(DispatchStatus::Pending),
            dispatch_date: Set(now),
            notes: Set(command.notes.clone()),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        Ok(created)
    }

    /// Rolls back the writes a failed saga left behind, newest first.
    /// Returns the error the caller should surface: the clean underlying
    /// cause when every rollback succeeded, or `PartialWriteFailure`
    /// naming the dangling records when one did not.
    async fn compensate(
        &self,
        completed: Vec<SagaWrite>,
        failed_step: &str,
        cause: ServiceError,
    ) -> ServiceError {
        let completed_names: Vec<String> =
            completed.iter().map(|w| w.name().to_string()).collect();
        let mut compensated = Vec::new();
        let mut dangling = Vec::new();

        for write in completed.iter().rev() {
            let result = match write {
                SagaWrite::Shipment(id) => shipment::Entity::delete_by_id(*id)
                    .exec(&*self.db)
                    .await
                    .map(|_| ()),
                SagaWrite::DispatchRecord(id) => {
                    dispatch_record::Entity::delete_by_id(id.clone())
                        .exec(&*self.db)
                        .await
                        .map(|_| ())
                }
            };

            match result {
                Ok(()) => compensated.push(write.name().to_string()),
                Err(err) => {
                    error!(
                        record = write.name(),
                        error = %err,
                        "compensating delete failed; record left dangling"
                    );
                    dangling.push(write.name().to_string());
                }
            }
        }

        if dangling.is_empty() {
            warn!(
                step = failed_step,
                "dispatch failed; earlier writes rolled back cleanly"
            );
            cause
        } else {
            ServiceError::PartialWriteFailure {
                message: format!("{} failed: {}", failed_step, cause.response_message()),
                completed: completed_names,
                compensated,
                dangling,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_ids_have_expected_shape() {
        let id = generate_dispatch_id();
        assert!(id.starts_with("DSP-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u32>().is_ok());
    }

    #[test]
    fn command_validation_rejects_empty_fields() {
        let command = DispatchStockCommand {
            stock_id: Uuid::new_v4(),
            dispatch_quantity: 0,
            invoice_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            customer_name: String::new(),
            courier_id: Uuid::new_v4(),
            customer_phone: String::new(),
            customer_address: "12 Harbour Road".to_string(),
            estimated_delivery: None,
            notes: None,
        };

        let err = command.validate().unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("dispatch_quantity") || rendered.contains("positive"));
    }

    #[test]
    fn command_validation_accepts_complete_input() {
        let command = DispatchStockCommand {
            stock_id: Uuid::new_v4(),
            dispatch_quantity: 5,
            invoice_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            customer_name: "Acme Hardware".to_string(),
            courier_id: Uuid::new_v4(),
            customer_phone: "+44 20 7946 0000".to_string(),
            customer_address: "12 Harbour Road".to_string(),
            estimated_delivery: None,
            notes: Some("leave at reception".to_string()),
        };

        assert!(command.validate().is_ok());
    }
}
