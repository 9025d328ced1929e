//! SeaORM implementation of SpotRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::db_err;
use crate::domain::spot::{Spot, SpotRepository, SpotStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::spot;

pub(super) const AVAILABLE: &str = "Available";
pub(super) const OCCUPIED: &str = "Occupied";

pub struct SeaOrmSpotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSpotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: spot::Model) -> DomainResult<Spot> {
    let status = SpotStatus::from_str(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("spot {} has unknown status '{}'", m.id, m.status))
    })?;
    Ok(Spot {
        id: m.id,
        lot_id: m.lot_id,
        status,
    })
}

fn models_to_domain(models: Vec<spot::Model>) -> DomainResult<Vec<Spot>> {
    models.into_iter().map(model_to_domain).collect()
}

/// Rows per INSERT. Each row binds 3 values, which keeps a batch well under
/// SQLite's bound-variable limit.
const SPOT_INSERT_BATCH: i32 = 1000;

/// Append `count` Available spots to a lot on the given connection or
/// transaction, in batches of [`SPOT_INSERT_BATCH`].
pub(super) async fn insert_spots<C>(
    db: &C,
    lot_id: i32,
    count: i32,
    created_at: DateTime<Utc>,
) -> DomainResult<()>
where
    C: ConnectionTrait,
{
    let mut remaining = count;
    while remaining > 0 {
        let batch = remaining.min(SPOT_INSERT_BATCH);
        let rows = (0..batch).map(|_| spot::ActiveModel {
            lot_id: Set(lot_id),
            status: Set(AVAILABLE.to_string()),
            created_at: Set(created_at),
            ..Default::default()
        });
        spot::Entity::insert_many(rows)
            .exec(db)
            .await
            .map_err(db_err)?;
        remaining -= batch;
    }
    Ok(())
}

// ── SpotRepository impl ─────────────────────────────────────────

#[async_trait]
impl SpotRepository for SeaOrmSpotRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Spot>> {
        spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Spot>> {
        let models = spot::Entity::find()
            .filter(spot::Column::LotId.eq(lot_id))
            .order_by_asc(spot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_all(&self) -> DomainResult<Vec<Spot>> {
        let models = spot::Entity::find()
            .order_by_asc(spot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_available(&self, lot_id: i32) -> DomainResult<Option<Spot>> {
        spot::Entity::find()
            .filter(spot::Column::LotId.eq(lot_id))
            .filter(spot::Column::Status.eq(AVAILABLE))
            .order_by_asc(spot::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn delete_if_available(&self, id: i32) -> DomainResult<()> {
        debug!("Deleting spot {}", id);

        let result = spot::Entity::delete_many()
            .filter(spot::Column::Id.eq(id))
            .filter(spot::Column::Status.eq(AVAILABLE))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected > 0 {
            return Ok(());
        }
        match spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        {
            Some(_) => Err(DomainError::Conflict(format!("spot {} is occupied", id))),
            None => Err(DomainError::not_found("Spot", "id", id)),
        }
    }
}
