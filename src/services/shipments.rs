use crate::{
    db::DbPool,
    entities::{courier, shipment, shipment::ShipmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Tracking numbers are derived from the current time plus a random
/// suffix; uniqueness is backed by the index on the column.
pub fn generate_tracking_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10_000);
    format!("TRK-{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone)]
pub struct CreateShipmentInput {
    pub order_id: Option<Uuid>,
    pub courier_id: Uuid,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub items: Vec<ShipmentLine>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ShipmentLine {
    pub item_name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateShipmentInput {
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Service for managing shipments
#[derive(Clone)]
pub struct ShipmentService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ShipmentService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Lists shipments with pagination and an optional status filter.
    #[instrument(skip(self))]
    pub async fn list_shipments(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<shipment::Model>, u64), ServiceError> {
        let mut query = shipment::Entity::find();

        if let Some(status_filter) = status {
            if let Ok(parsed) = status_filter.parse::<ShipmentStatus>() {
                query = query.filter(shipment::Column::Status.eq(parsed));
            } else {
                // Unknown status matches nothing.
                return Ok((vec![], 0));
            }
        }

        let paginator = query
            .order_by_desc(shipment::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let shipments = paginator.fetch_page(page - 1).await?;

        Ok((shipments, total))
    }

    #[instrument(skip(self))]
    pub async fn get_shipment(&self, id: Uuid) -> Result<Option<shipment::Model>, ServiceError> {
        let found = shipment::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    /// Finds a shipment by its unique tracking number.
    #[instrument(skip(self))]
    pub async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<shipment::Model>, ServiceError> {
        let found = shipment::Entity::find()
            .filter(shipment::Column::TrackingNumber.eq(tracking_number.to_string()))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    /// Creates a standalone shipment. The courier must exist and be
    /// active; the tracking number is generated here.
    #[instrument(skip(self))]
    pub async fn create_shipment(
        &self,
        input: CreateShipmentInput,
    ) -> Result<shipment::Model, ServiceError> {
        let courier = courier::Entity::find_by_id(input.courier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Courier {} not found", input.courier_id))
            })?;
        if !courier.is_active {
            return Err(ServiceError::ValidationError(format!(
                "Courier '{}' is not active",
                courier.name
            )));
        }

        let items = serde_json::to_value(&input.items)
            .map_err(|e| ServiceError::InternalError(format!("failed to encode items: {}", e)))?;

        let model = shipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(input.order_id),
            courier_id: Set(courier.id),
            courier_name: Set(courier.name.clone()),
            tracking_number: Set(generate_tracking_number()),
            customer_name: Set(input.customer_name),
            customer_address: Set(input.customer_address),
            customer_phone: Set(input.customer_phone),
            status: Set(ShipmentStatus::Pending),
            estimated_delivery: Set(input.estimated_delivery),
            pickup_date: Set(None),
            delivery_date: Set(None),
            items: Set(items),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ShipmentCreated(created.id))
            .await;
        Ok(created)
    }

    /// Updates recipient details on a shipment.
    #[instrument(skip(self))]
    pub async fn update_shipment(
        &self,
        id: Uuid,
        input: UpdateShipmentInput,
    ) -> Result<shipment::Model, ServiceError> {
        let model = shipment::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {} not found", id)))?;

        let mut active: shipment::ActiveModel = model.into();
        if let Some(customer_name) = input.customer_name {
            active.customer_name = Set(customer_name);
        }
        if let Some(customer_address) = input.customer_address {
            active.customer_address = Set(customer_address);
        }
        if let Some(customer_phone) = input.customer_phone {
            active.customer_phone = Set(customer_phone);
        }
        if let Some(estimated_delivery) = input.estimated_delivery {
            active.estimated_delivery = Set(Some(estimated_delivery));
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ShipmentUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Updates a shipment's status. Transitions are unconstrained; moving
    /// to `PickedUp` or `Delivered` stamps the corresponding date when the
    /// caller did not supply one and it is not already set.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ShipmentStatus,
        delivery_date: Option<DateTime<Utc>>,
    ) -> Result<shipment::Model, ServiceError> {
        let model = shipment::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {} not found", id)))?;

        let old_status = model.status;
        let pickup_unset = model.pickup_date.is_none();
        let delivery_unset = model.delivery_date.is_none();

        let mut active: shipment::ActiveModel = model.into();
        active.status = Set(status);

        if status == ShipmentStatus::PickedUp && pickup_unset {
            active.pickup_date = Set(Some(Utc::now()));
        }
        if status == ShipmentStatus::Delivered {
            if let Some(date) = delivery_date {
                active.delivery_date = Set(Some(date));
            } else if delivery_unset {
                active.delivery_date = Set(Some(Utc::now()));
            }
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ShipmentStatusChanged {
                shipment_id: updated.id,
                old_status: old_status.to_string(),
                new_status: updated.status.to_string(),
            })
            .await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_numbers_have_expected_shape() {
        let tn = generate_tracking_number();
        assert!(tn.starts_with("TRK-"));
        let parts: Vec<&str> = tn.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u32>().is_ok());
    }
}
