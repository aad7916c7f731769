use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Shipment status enumeration.
///
/// Transitions are deliberately unconstrained: the courier's real-world
/// progress does not always arrive in order, so any state may be written
/// over any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ShipmentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "PickedUp")]
    PickedUp,
    #[sea_orm(string_value = "InTransit")]
    InTransit,
    #[sea_orm(string_value = "OutForDelivery")]
    OutForDelivery,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentStatus::Pending => write!(f, "Pending"),
            ShipmentStatus::PickedUp => write!(f, "Picked Up"),
            ShipmentStatus::InTransit => write!(f, "In Transit"),
            ShipmentStatus::OutForDelivery => write!(f, "Out for Delivery"),
            ShipmentStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "pending" => Ok(ShipmentStatus::Pending),
            "pickedup" => Ok(ShipmentStatus::PickedUp),
            "intransit" => Ok(ShipmentStatus::InTransit),
            "outfordelivery" => Ok(ShipmentStatus::OutForDelivery),
            "delivered" => Ok(ShipmentStatus::Delivered),
            other => Err(format!("unknown shipment status '{}'", other)),
        }
    }
}

/// A courier-tracked delivery unit created as part of a dispatch.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Sales order this shipment fulfils, when known
    pub order_id: Option<Uuid>,

    /// Courier carrying the shipment (weak reference, lookup/display only)
    pub courier_id: Uuid,

    /// Denormalized courier name at creation time
    pub courier_name: String,

    /// Generated tracking number, unique across all shipments
    #[validate(length(
        min = 1,
        max = 100,
        message = "Tracking number must be between 1 and 100 characters"
    ))]
    pub tracking_number: String,

    /// Recipient name
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,

    /// Full delivery address
    #[validate(length(
        min = 1,
        max = 500,
        message = "Delivery address must be between 1 and 500 characters"
    ))]
    pub customer_address: String,

    /// Recipient phone
    #[validate(length(min = 1, max = 50))]
    pub customer_phone: String,

    pub status: ShipmentStatus,

    /// Estimated delivery date
    pub estimated_delivery: Option<DateTime<Utc>>,

    /// Set when the courier picks the shipment up
    pub pickup_date: Option<DateTime<Utc>>,

    /// Set when the shipment is delivered
    pub delivery_date: Option<DateTime<Utc>>,

    /// Shipped lines: `[{ "item_name": ..., "quantity": ... }]`
    pub items: Json,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courier::Entity",
        from = "Column::CourierId",
        to = "super::courier::Column::Id"
    )]
    Courier,
}

impl Related<super::courier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courier.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Utc::now());

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display_and_parse() {
        for status in [
            ShipmentStatus::Pending,
            ShipmentStatus::PickedUp,
            ShipmentStatus::InTransit,
            ShipmentStatus::OutForDelivery,
            ShipmentStatus::Delivered,
        ] {
            let parsed: ShipmentStatus = status.to_string().parse().expect("parse back");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_parse_accepts_loose_spellings() {
        assert_eq!(
            "in-transit".parse::<ShipmentStatus>().unwrap(),
            ShipmentStatus::InTransit
        );
        assert_eq!(
            "out_for_delivery".parse::<ShipmentStatus>().unwrap(),
            ShipmentStatus::OutForDelivery
        );
        assert!("teleported".parse::<ShipmentStatus>().is_err());
    }
}
