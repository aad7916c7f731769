use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Dispatch record status enumeration. Updated independently of the linked
/// shipment's status via its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DispatchStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "InTransit")]
    InTransit,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStatus::Pending => write!(f, "Pending"),
            DispatchStatus::InTransit => write!(f, "In Transit"),
            DispatchStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for DispatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "pending" => Ok(DispatchStatus::Pending),
            "intransit" => Ok(DispatchStatus::InTransit),
            "delivered" => Ok(DispatchStatus::Delivered),
            other => Err(format!("unknown dispatch status '{}'", other)),
        }
    }
}

/// Append-only record of a stock dispatch. Created once per dispatch
/// action; only `status` and `notes` change afterwards, and records are
/// never deleted in normal operation.
///
/// The primary key keeps the original time-derived human-readable code
/// (e.g. `DSP-1723026000123-4821`) because it is printed on packing slips.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "dispatch_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dispatch_id: String,

    /// Stock item the quantity was taken from (weak reference)
    pub stock_id: Uuid,

    /// Denormalized item name at dispatch time
    #[validate(length(min = 1, max = 255))]
    pub item_name: String,

    /// Quantity dispatched, always positive
    #[validate(range(min = 1, message = "Dispatched quantity must be positive"))]
    pub dispatched_quantity: i32,

    /// Invoice the dispatch fulfils (weak reference)
    pub invoice_id: Uuid,

    /// Customer the dispatch is for (weak reference)
    pub customer_id: Uuid,

    /// Denormalized customer name at dispatch time
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,

    /// Shipment created alongside this record, when the workflow produced one
    pub shipment_id: Option<Uuid>,

    pub status: DispatchStatus,

    pub dispatch_date: DateTime<Utc>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

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
    fn status_parses_all_variants() {
        assert_eq!(
            "Pending".parse::<DispatchStatus>().unwrap(),
            DispatchStatus::Pending
        );
        assert_eq!(
            "In Transit".parse::<DispatchStatus>().unwrap(),
            DispatchStatus::InTransit
        );
        assert_eq!(
            "delivered".parse::<DispatchStatus>().unwrap(),
            DispatchStatus::Delivered
        );
        assert!("returned".parse::<DispatchStatus>().is_err());
    }
}
