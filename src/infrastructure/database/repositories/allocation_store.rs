//! SeaORM implementation of AllocationStore
//!
//! Both units run in one database transaction and start with a conditional
//! update, so a concurrent writer that got there first leaves zero affected
//! rows instead of a double assignment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::db_err;
use super::reservation_repository::model_to_domain;
use super::spot_repository::{AVAILABLE, OCCUPIED};
use crate::domain::{
    AllocationStore, ClaimOutcome, DomainError, DomainResult, NewReservation, Reservation,
};
use crate::infrastructure::database::entities::{reservation, spot};
use crate::shared::money::to_minor_units;

pub struct SeaOrmAllocationStore {
    db: DatabaseConnection,
}

impl SeaOrmAllocationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AllocationStore for SeaOrmAllocationStore {
    async fn claim_and_open(&self, request: NewReservation) -> DomainResult<ClaimOutcome> {
        debug!("Claiming spot {} for user {}", request.spot_id, request.user_id);

        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = spot::Entity::update_many()
            .col_expr(spot::Column::Status, Expr::value(OCCUPIED))
            .filter(spot::Column::Id.eq(request.spot_id))
            .filter(spot::Column::Status.eq(AVAILABLE))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if claimed.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Ok(ClaimOutcome::Lost);
        }

        // The partial unique indexes reject a second open reservation for
        // the spot or the user; dropping `txn` on error rolls the claim back.
        let model = reservation::ActiveModel {
            spot_id: Set(request.spot_id),
            lot_id: Set(request.lot_id),
            user_id: Set(request.user_id),
            vehicle_number: Set(request.vehicle_number),
            started_at: Set(request.started_at),
            ended_at: Set(None),
            cost_cents: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(ClaimOutcome::Claimed(model_to_domain(model)))
    }

    async fn close_and_free(
        &self,
        reservation_id: i32,
        user_id: i32,
        ended_at: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation> {
        debug!("Closing reservation {} for user {}", reservation_id, user_id);

        let cost_cents = to_minor_units(cost)?;
        let txn = self.db.begin().await.map_err(db_err)?;

        let closed = reservation::Entity::update_many()
            .col_expr(reservation::Column::EndedAt, Expr::value(Some(ended_at)))
            .col_expr(reservation::Column::CostCents, Expr::value(Some(cost_cents)))
            .filter(reservation::Column::Id.eq(reservation_id))
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::EndedAt.is_null())
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let model = reservation::Entity::find_by_id(reservation_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        if closed.rows_affected == 0 {
            return Err(DomainError::InvalidState(format!(
                "reservation {} is not open for user {}",
                reservation_id, user_id
            )));
        }

        spot::Entity::update_many()
            .col_expr(spot::Column::Status, Expr::value(AVAILABLE))
            .filter(spot::Column::Id.eq(model.spot_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }
}
