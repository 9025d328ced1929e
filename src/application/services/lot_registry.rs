//! Lot registry: capacity management, listing and occupancy views.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::info;

use crate::domain::{
    DomainError, DomainResult, Lot, LotChanges, LotFilter, LotOccupancy, LotUpdate, NewLot,
    RepositoryProvider, Spot, SpotDetail, SpotStatus,
};
use crate::shared::time::SharedClock;

pub struct LotRegistry {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
}

impl LotRegistry {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        Self { repos, clock }
    }

    /// Create a lot together with `capacity` Available spots.
    pub async fn create_lot(&self, lot: NewLot) -> DomainResult<Lot> {
        let lot = self
            .repos
            .lots()
            .create(lot.validated()?, self.clock.now())
            .await?;
        info!(lot_id = lot.id, capacity = lot.capacity, price = %lot.price_per_hour, "Lot created");
        Ok(lot)
    }

    /// Apply `changes`; growing capacity appends the difference as new
    /// Available spots, shrinking never removes spots.
    pub async fn update_lot(&self, id: i32, changes: LotChanges) -> DomainResult<Lot> {
        let LotUpdate { lot, added_spots } = self
            .repos
            .lots()
            .update(id, changes, self.clock.now())
            .await?;
        info!(lot_id = lot.id, capacity = lot.capacity, added_spots, "Lot updated");
        Ok(lot)
    }

    /// Remove the lot and all its spots; `Conflict` while any is occupied.
    pub async fn delete_lot(&self, id: i32) -> DomainResult<()> {
        self.repos.lots().delete_if_idle(id).await?;
        info!(lot_id = id, "Lot deleted");
        Ok(())
    }

    pub async fn get_lot(&self, id: i32) -> DomainResult<Lot> {
        self.repos
            .lots()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", "id", id))
    }

    /// Lots matching every given criterion, ordered by id
    pub async fn list_lots(&self, filter: &LotFilter) -> DomainResult<Vec<Lot>> {
        let visited: Option<HashSet<i32>> = match filter.user_id {
            Some(user_id) => Some(
                self.repos
                    .reservations()
                    .find_by_user(user_id)
                    .await?
                    .into_iter()
                    .map(|r| r.lot_id)
                    .collect(),
            ),
            None => None,
        };
        let text = filter.text.as_deref().unwrap_or_default();

        Ok(self
            .repos
            .lots()
            .find_all()
            .await?
            .into_iter()
            .filter(|lot| visited.as_ref().map_or(true, |ids| ids.contains(&lot.id)))
            .filter(|lot| lot.matches_text(text))
            .collect())
    }

    pub async fn list_spots(&self, lot_id: i32) -> DomainResult<Vec<Spot>> {
        self.get_lot(lot_id).await?;
        self.repos.spots().find_by_lot(lot_id).await
    }

    /// Available/occupied counts per lot, ordered by lot id
    pub async fn lot_summary(&self) -> DomainResult<Vec<LotOccupancy>> {
        let mut summary: BTreeMap<i32, LotOccupancy> = self
            .repos
            .lots()
            .find_all()
            .await?
            .into_iter()
            .map(|lot| {
                (
                    lot.id,
                    LotOccupancy {
                        lot_id: lot.id,
                        name: lot.name,
                        capacity: lot.capacity,
                        available: 0,
                        occupied: 0,
                    },
                )
            })
            .collect();

        for spot in self.repos.spots().find_all().await? {
            if let Some(entry) = summary.get_mut(&spot.lot_id) {
                match spot.status {
                    SpotStatus::Available => entry.available += 1,
                    SpotStatus::Occupied => entry.occupied += 1,
                }
            }
        }

        Ok(summary.into_values().collect())
    }

    /// The spot, its lot and, if occupied, who holds it
    pub async fn spot_detail(&self, spot_id: i32) -> DomainResult<SpotDetail> {
        let spot = self
            .repos
            .spots()
            .find_by_id(spot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Spot", "id", spot_id))?;
        let lot = self.get_lot(spot.lot_id).await?;
        let active_reservation = self
            .repos
            .reservations()
            .find_active_for_spot(spot_id)
            .await?;
        Ok(SpotDetail {
            spot,
            lot,
            active_reservation,
        })
    }

    /// Remove a single spot; `Conflict` if it is occupied.
    pub async fn delete_spot(&self, spot_id: i32) -> DomainResult<()> {
        self.repos.spots().delete_if_available(spot_id).await?;
        info!(spot_id, "Spot deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::application::AllocationEngine;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use chrono::{TimeZone, Utc};

    use crate::shared::time::{ManualClock, SystemClock};

    fn registry() -> (Arc<dyn RepositoryProvider>, LotRegistry, AllocationEngine) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let engine = AllocationEngine::new(repos.clone(), Arc::new(SystemClock));
        let registry = LotRegistry::new(repos.clone(), Arc::new(SystemClock));
        (repos, registry, engine)
    }

    fn new_lot(name: &str, postal_code: &str, capacity: i32) -> NewLot {
        NewLot {
            name: name.into(),
            address: "Station Road".into(),
            postal_code: postal_code.into(),
            price_per_hour: Decimal::new(2500, 2),
            capacity,
        }
    }

    #[tokio::test]
    async fn create_materializes_capacity_spots() {
        let (repos, registry, _) = registry();
        let lot = registry.create_lot(new_lot("Airport", "110037", 5)).await.unwrap();

        let spots = registry.list_spots(lot.id).await.unwrap();
        assert_eq!(spots.len(), 5);
        assert!(spots.iter().all(|s| s.lot_id == lot.id && s.is_available()));
        assert_eq!(repos.lots().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_input_without_writing() {
        let (repos, registry, _) = registry();
        let err = registry.create_lot(new_lot("Airport", "110037", 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(repos.lots().count().await.unwrap(), 0);
        assert!(repos.spots().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn growing_adds_spots_and_shrinking_keeps_them() {
        let (_, registry, _) = registry();
        let lot = registry.create_lot(new_lot("Mall", "560034", 2)).await.unwrap();

        let grown = registry
            .update_lot(
                lot.id,
                LotChanges {
                    capacity: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(grown.capacity, 5);
        assert_eq!(registry.list_spots(lot.id).await.unwrap().len(), 5);

        let shrunk = registry
            .update_lot(
                lot.id,
                LotChanges {
                    capacity: Some(1),
                    name: Some("Mall West".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(shrunk.capacity, 1);
        assert_eq!(shrunk.name, "Mall West");
        assert_eq!(registry.list_spots(lot.id).await.unwrap().len(), 5);

        let missing = registry.update_lot(99, LotChanges::default()).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_is_blocked_while_occupied() {
        let (repos, registry, engine) = registry();
        let lot = registry.create_lot(new_lot("Harbour", "682001", 2)).await.unwrap();
        engine.reserve(lot.id, 3, "KL07CD4321").await.unwrap();

        let err = registry.delete_lot(lot.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(registry.list_spots(lot.id).await.unwrap().len(), 2);

        engine.release(None, 3).await.unwrap();
        registry.delete_lot(lot.id).await.unwrap();
        assert!(repos.spots().find_by_lot(lot.id).await.unwrap().is_empty());
        assert!(matches!(
            registry.get_lot(lot.id).await,
            Err(DomainError::NotFound { .. })
        ));
        // the ledger keeps the closed reservation
        assert_eq!(repos.reservations().find_by_user(3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_text_and_user_history() {
        let (_, registry, engine) = registry();
        let airport = registry.create_lot(new_lot("Airport", "110037", 1)).await.unwrap();
        let mall = registry.create_lot(new_lot("City Mall", "560034", 1)).await.unwrap();

        let all = registry.list_lots(&LotFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_text = registry
            .list_lots(&LotFilter {
                text: Some("mall".into()),
                user_id: None,
            })
            .await
            .unwrap();
        assert_eq!(by_text.iter().map(|l| l.id).collect::<Vec<_>>(), vec![mall.id]);

        let by_pin = registry
            .list_lots(&LotFilter {
                text: Some("1100".into()),
                user_id: None,
            })
            .await
            .unwrap();
        assert_eq!(by_pin[0].id, airport.id);

        engine.reserve(airport.id, 8, "DL01ZZ9999").await.unwrap();
        let visited = registry
            .list_lots(&LotFilter {
                text: None,
                user_id: Some(8),
            })
            .await
            .unwrap();
        assert_eq!(visited.iter().map(|l| l.id).collect::<Vec<_>>(), vec![airport.id]);

        let both = registry
            .list_lots(&LotFilter {
                text: Some("mall".into()),
                user_id: Some(8),
            })
            .await
            .unwrap();
        assert!(both.is_empty());
    }

    #[tokio::test]
    async fn summary_and_spot_detail_follow_occupancy() {
        let (_, registry, engine) = registry();
        let lot = registry.create_lot(new_lot("Stadium", "700091", 3)).await.unwrap();
        let allocation = engine.reserve(lot.id, 4, "WB02EF1122").await.unwrap();

        let summary = registry.lot_summary().await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].available, 2);
        assert_eq!(summary[0].occupied, 1);
        assert_eq!(summary[0].total(), 3);

        let detail = registry.spot_detail(allocation.reservation.spot_id).await.unwrap();
        assert_eq!(detail.spot.status, SpotStatus::Occupied);
        assert_eq!(detail.lot.id, lot.id);
        assert_eq!(detail.active_reservation.unwrap().user_id, 4);

        let err = registry.delete_spot(allocation.reservation.spot_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let free = registry
            .list_spots(lot.id)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.is_available())
            .unwrap();
        registry.delete_spot(free.id).await.unwrap();
        assert!(matches!(
            registry.spot_detail(free.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn lot_timestamps_come_from_the_clock() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let opened = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let registry = LotRegistry::new(repos, Arc::new(ManualClock::new(opened)));

        let lot = registry.create_lot(new_lot("Depot", "600001", 1)).await.unwrap();
        assert_eq!(lot.created_at, opened);
        assert_eq!(registry.get_lot(lot.id).await.unwrap().created_at, opened);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_growth_to_same_capacity_adds_delta_once() {
        let (_, registry, _) = registry();
        let registry = Arc::new(registry);
        let lot_id = registry
            .create_lot(new_lot("Stadium", "400001", 1))
            .await
            .unwrap()
            .id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .update_lot(
                            lot_id,
                            LotChanges {
                                capacity: Some(2),
                                ..Default::default()
                            },
                        )
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().capacity, 2);
        }

        assert_eq!(registry.list_spots(lot_id).await.unwrap().len(), 2);
    }
}
