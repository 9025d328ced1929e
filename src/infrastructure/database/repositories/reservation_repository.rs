//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select};

use super::db_err;
use crate::domain::reservation::{Reservation, ReservationRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::reservation;
use crate::shared::money::from_minor_units;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn newest_first(
        &self,
        query: Select<reservation::Entity>,
    ) -> DomainResult<Vec<Reservation>> {
        let models = query
            .order_by_desc(reservation::Column::StartedAt)
            .order_by_desc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        spot_id: m.spot_id,
        lot_id: m.lot_id,
        user_id: m.user_id,
        vehicle_number: m.vehicle_number,
        started_at: m.started_at,
        ended_at: m.ended_at,
        cost: m.cost_cents.map(from_minor_units),
    }
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_active_for_user(&self, user_id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::EndedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::SpotId.eq(spot_id))
            .filter(reservation::Column::EndedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_active(&self) -> DomainResult<Vec<Reservation>> {
        self.newest_first(
            reservation::Entity::find().filter(reservation::Column::EndedAt.is_null()),
        )
        .await
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        self.newest_first(
            reservation::Entity::find().filter(reservation::Column::UserId.eq(user_id)),
        )
        .await
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        self.newest_first(reservation::Entity::find()).await
    }
}
