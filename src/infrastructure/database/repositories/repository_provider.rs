//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::lot::LotRepository;
use crate::domain::repositories::{AllocationStore, RepositoryProvider};
use crate::domain::reservation::ReservationRepository;
use crate::domain::spot::SpotRepository;

use super::allocation_store::SeaOrmAllocationStore;
use super::lot_repository::SeaOrmLotRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::spot_repository::SeaOrmSpotRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let lot = repos.lots().find_by_id(1).await?;
/// let spot = repos.spots().find_available(1).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    lots: SeaOrmLotRepository,
    spots: SeaOrmSpotRepository,
    reservations: SeaOrmReservationRepository,
    allocations: SeaOrmAllocationStore,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            lots: SeaOrmLotRepository::new(db.clone()),
            spots: SeaOrmSpotRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            allocations: SeaOrmAllocationStore::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        &self.lots
    }

    fn spots(&self) -> &dyn SpotRepository {
        &self.spots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn allocations(&self) -> &dyn AllocationStore {
        &self.allocations
    }
}
