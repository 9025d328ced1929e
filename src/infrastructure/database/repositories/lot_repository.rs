//! SeaORM implementation of LotRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::db_err;
use super::spot_repository::{insert_spots, OCCUPIED};
use crate::domain::lot::{Lot, LotChanges, LotRepository, LotUpdate, NewLot};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{lot, spot};
use crate::shared::money::{from_minor_units, to_minor_units};

pub struct SeaOrmLotRepository {
    db: DatabaseConnection,
}

impl SeaOrmLotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: lot::Model) -> Lot {
    Lot {
        id: m.id,
        name: m.name,
        address: m.address,
        postal_code: m.postal_code,
        price_per_hour: from_minor_units(m.price_per_hour_cents),
        capacity: m.capacity,
        created_at: m.created_at,
    }
}

// ── LotRepository impl ──────────────────────────────────────────

#[async_trait]
impl LotRepository for SeaOrmLotRepository {
    async fn create(&self, new: NewLot, created_at: DateTime<Utc>) -> DomainResult<Lot> {
        debug!("Creating lot '{}' with {} spots", new.name, new.capacity);

        let price_cents = to_minor_units(new.price_per_hour)?;
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = lot::ActiveModel {
            name: Set(new.name),
            address: Set(new.address),
            postal_code: Set(new.postal_code),
            price_per_hour_cents: Set(price_cents),
            capacity: Set(new.capacity),
            created_at: Set(created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        insert_spots(&txn, model.id, new.capacity, created_at).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>> {
        let model = lot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Lot>> {
        let models = lot::Entity::find()
            .order_by_asc(lot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        lot::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn update(
        &self,
        id: i32,
        changes: LotChanges,
        at: DateTime<Utc>,
    ) -> DomainResult<LotUpdate> {
        debug!("Updating lot {}", id);

        let txn = self.db.begin().await.map_err(db_err)?;

        let stored = lot::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Lot", "id", id))?;

        let mut lot = model_to_domain(stored);
        let touched = changes.clone();
        let added_spots = lot.apply(changes)?;

        let mut update = lot::Entity::update_many().filter(lot::Column::Id.eq(id));
        let mut dirty = false;
        if touched.name.is_some() {
            update = update.col_expr(lot::Column::Name, Expr::value(lot.name.clone()));
            dirty = true;
        }
        if touched.address.is_some() {
            update = update.col_expr(lot::Column::Address, Expr::value(lot.address.clone()));
            dirty = true;
        }
        if touched.postal_code.is_some() {
            update = update.col_expr(
                lot::Column::PostalCode,
                Expr::value(lot.postal_code.clone()),
            );
            dirty = true;
        }
        if touched.price_per_hour.is_some() {
            let price_cents = to_minor_units(lot.price_per_hour)?;
            update = update.col_expr(lot::Column::PricePerHourCents, Expr::value(price_cents));
            dirty = true;
        }
        if touched.capacity.is_some() {
            update = update.col_expr(lot::Column::Capacity, Expr::value(lot.capacity));
            dirty = true;
        }
        if dirty {
            update.exec(&txn).await.map_err(db_err)?;
        }

        insert_spots(&txn, id, added_spots, at).await?;
        txn.commit().await.map_err(db_err)?;

        debug!("Lot {} updated (+{} spots)", id, added_spots);
        Ok(LotUpdate { lot, added_spots })
    }

    async fn delete_if_idle(&self, id: i32) -> DomainResult<()> {
        debug!("Deleting lot {}", id);

        let txn = self.db.begin().await.map_err(db_err)?;

        if lot::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .is_none()
        {
            return Err(DomainError::not_found("Lot", "id", id));
        }

        let occupied = spot::Entity::find()
            .filter(spot::Column::LotId.eq(id))
            .filter(spot::Column::Status.eq(OCCUPIED))
            .count(&txn)
            .await
            .map_err(db_err)?;
        if occupied > 0 {
            return Err(DomainError::Conflict(format!(
                "lot {} has {} occupied spots",
                id, occupied
            )));
        }

        spot::Entity::delete_many()
            .filter(spot::Column::LotId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        lot::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }
}
