//! Read side of the reservation ledger: active lookups, history and totals.
//!
//! Nothing here takes the allocation locks; readers may observe a write in
//! flight on another task.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{
    format_duration, DomainResult, HistoryCost, HistoryEntry, LotUsage, ParkingStats,
    RepositoryProvider, Reservation, SpotStatus,
};

pub struct ReservationLedger {
    repos: Arc<dyn RepositoryProvider>,
}

impl ReservationLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn active_for_user(&self, user_id: i32) -> DomainResult<Option<Reservation>> {
        self.repos.reservations().find_active_for_user(user_id).await
    }

    pub async fn active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        self.repos.reservations().find_active_for_spot(spot_id).await
    }

    /// Every open reservation ("who is parked where")
    pub async fn active_reservations(&self) -> DomainResult<Vec<HistoryEntry>> {
        let active = self.repos.reservations().find_active().await?;
        self.entries(active).await
    }

    /// A user's reservations, newest first
    pub async fn history(&self, user_id: i32) -> DomainResult<Vec<HistoryEntry>> {
        let reservations = self.repos.reservations().find_by_user(user_id).await?;
        self.entries(reservations).await
    }

    /// All reservations, newest first
    pub async fn all_history(&self) -> DomainResult<Vec<HistoryEntry>> {
        let reservations = self.repos.reservations().find_all().await?;
        self.entries(reservations).await
    }

    /// Reservation count per lot for one user, ordered by lot id
    pub async fn user_lot_summary(&self, user_id: i32) -> DomainResult<Vec<LotUsage>> {
        let names = self.lot_names().await?;
        let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
        for reservation in self.repos.reservations().find_by_user(user_id).await? {
            *counts.entry(reservation.lot_id).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(lot_id, reservations)| LotUsage {
                lot_id,
                lot_name: names.get(&lot_id).cloned(),
                reservations,
            })
            .collect())
    }

    pub async fn stats(&self) -> DomainResult<ParkingStats> {
        let total_lots = self.repos.lots().count().await?;
        let spots = self.repos.spots().find_all().await?;
        let reservations = self.repos.reservations().find_all().await?;

        let occupied_spots = spots
            .iter()
            .filter(|s| s.status == SpotStatus::Occupied)
            .count() as u64;
        let active_reservations = reservations.iter().filter(|r| r.is_active()).count() as u64;
        let total_revenue = reservations
            .iter()
            .filter_map(|r| r.cost)
            .fold(Decimal::ZERO, |acc, cost| acc + cost);

        Ok(ParkingStats {
            total_lots,
            total_spots: spots.len() as u64,
            occupied_spots,
            total_reservations: reservations.len() as u64,
            active_reservations,
            total_revenue,
        })
    }

    async fn lot_names(&self) -> DomainResult<HashMap<i32, String>> {
        Ok(self
            .repos
            .lots()
            .find_all()
            .await?
            .into_iter()
            .map(|lot| (lot.id, lot.name))
            .collect())
    }

    async fn entries(&self, reservations: Vec<Reservation>) -> DomainResult<Vec<HistoryEntry>> {
        let names = self.lot_names().await?;
        Ok(reservations
            .into_iter()
            .map(|reservation| history_entry(reservation, &names))
            .collect())
    }
}

fn history_entry(reservation: Reservation, names: &HashMap<i32, String>) -> HistoryEntry {
    let lot_name = names.get(&reservation.lot_id).cloned();
    let (duration, cost) = match (reservation.duration(), reservation.cost) {
        (Some(elapsed), Some(cost)) => (Some(format_duration(elapsed)), HistoryCost::Billed(cost)),
        _ => (None, HistoryCost::InProgress),
    };
    HistoryEntry {
        reservation,
        lot_name,
        duration,
        cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::application::AllocationEngine;
    use crate::domain::NewLot;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use crate::shared::time::ManualClock;

    async fn lot(repos: &Arc<dyn RepositoryProvider>, name: &str, price: i64) -> i32 {
        repos
            .lots()
            .create(
                NewLot {
                    name: name.into(),
                    address: "Ring Road".into(),
                    postal_code: "400001".into(),
                    price_per_hour: Decimal::from(price),
                    capacity: 2,
                },
                Utc::now(),
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn history_is_newest_first_with_in_progress_sentinel() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let engine = AllocationEngine::new(repos.clone(), clock.clone());
        let ledger = ReservationLedger::new(repos.clone());

        let north = lot(&repos, "North", 30).await;
        let south = lot(&repos, "South", 10).await;

        engine.reserve(north, 1, "MH12XY0001").await.unwrap();
        clock.advance(Duration::minutes(125));
        engine.release(None, 1).await.unwrap();

        clock.advance(Duration::minutes(5));
        engine.reserve(south, 1, "MH12XY0001").await.unwrap();

        let history = ledger.history(1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].lot_name.as_deref(), Some("South"));
        assert_eq!(history[0].cost, HistoryCost::InProgress);
        assert!(history[0].duration.is_none());
        assert_eq!(history[1].duration.as_deref(), Some("2h 5m"));
        assert_eq!(history[1].cost, HistoryCost::Billed(Decimal::from(90)));

        let active = ledger.active_reservations().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].reservation.lot_id, south);

        let spot_id = active[0].reservation.spot_id;
        assert!(ledger.active_for_spot(spot_id).await.unwrap().is_some());
        assert!(ledger.active_for_user(1).await.unwrap().is_some());
        assert!(ledger.active_for_user(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_and_per_lot_summary() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let clock = Arc::new(ManualClock::default());
        let engine = AllocationEngine::new(repos.clone(), clock.clone());
        let ledger = ReservationLedger::new(repos.clone());

        let north = lot(&repos, "North", 30).await;
        let south = lot(&repos, "South", 10).await;

        for lot_id in [north, north, south] {
            engine.reserve(lot_id, 5, "GJ05AA1111").await.unwrap();
            clock.advance(Duration::minutes(30));
            engine.release(None, 5).await.unwrap();
        }
        engine.reserve(south, 6, "GJ05BB2222").await.unwrap();

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.total_lots, 2);
        assert_eq!(stats.total_spots, 4);
        assert_eq!(stats.occupied_spots, 1);
        assert_eq!(stats.total_reservations, 4);
        assert_eq!(stats.active_reservations, 1);
        assert_eq!(stats.total_revenue, Decimal::from(70));

        let usage = ledger.user_lot_summary(5).await.unwrap();
        assert_eq!(
            usage,
            vec![
                LotUsage {
                    lot_id: north,
                    lot_name: Some("North".into()),
                    reservations: 2
                },
                LotUsage {
                    lot_id: south,
                    lot_name: Some("South".into()),
                    reservations: 1
                },
            ]
        );
        assert_eq!(ledger.all_history().await.unwrap().len(), 4);
    }
}
