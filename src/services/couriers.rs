use crate::{
    db::DbPool,
    entities::courier,
    errors::ServiceError,
    events::EventSender,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateCourierInput {
    pub name: String,
    pub phone: Option<String>,
    pub pricing: Decimal,
    pub rating: Decimal,
    pub is_active: Option<bool>,
    pub service_areas: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCourierInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub pricing: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub is_active: Option<bool>,
    pub service_areas: Option<String>,
}

/// Service for courier reference data
#[derive(Clone)]
pub struct CourierService {
    db: Arc<DbPool>,
    #[allow(dead_code)]
    event_sender: EventSender,
}

impl CourierService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_couriers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<courier::Model>, u64), ServiceError> {
        let paginator = courier::Entity::find()
            .order_by_asc(courier::Column::Name)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let couriers = paginator.fetch_page(page - 1).await?;

        Ok((couriers, total))
    }

    /// Active couriers only. This is what the dispatch UI offers as
    /// shipment carriers.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<courier::Model>, ServiceError> {
        let couriers = courier::Entity::find()
            .filter(courier::Column::IsActive.eq(true))
            .order_by_asc(courier::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(couriers)
    }

    #[instrument(skip(self))]
    pub async fn get_courier(&self, id: Uuid) -> Result<Option<courier::Model>, ServiceError> {
        let found = courier::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    #[instrument(skip(self))]
    pub async fn create_courier(
        &self,
        input: CreateCourierInput,
    ) -> Result<courier::Model, ServiceError> {
        let model = courier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            phone: Set(input.phone),
            pricing: Set(input.pricing),
            rating: Set(input.rating),
            is_active: Set(input.is_active.unwrap_or(true)),
            service_areas: Set(input.service_areas),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_courier(
        &self,
        id: Uuid,
        input: UpdateCourierInput,
    ) -> Result<courier::Model, ServiceError> {
        let model = courier::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Courier {} not found", id)))?;

        let mut active: courier::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(pricing) = input.pricing {
            active.pricing = Set(pricing);
        }
        if let Some(rating) = input.rating {
            active.rating = Set(rating);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(service_areas) = input.service_areas {
            active.service_areas = Set(Some(service_areas));
        }

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_courier(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = courier::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Courier {} not found", id)));
        }
        Ok(())
    }
}
