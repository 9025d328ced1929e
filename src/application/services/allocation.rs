//! Allocation engine: the reserve/release state machine.
//!
//! Same-user calls are serialized through a keyed mutex, which makes the
//! one-open-reservation-per-user check race free. Spot contention between
//! different users is resolved optimistically by the storage layer's
//! conditional claim: a lost claim is retried once with the next free
//! spot before giving up with `Conflict`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    compute_bill, validate_vehicle_number, Allocation, ClaimOutcome, DomainError, DomainResult,
    NewReservation, Release, RepositoryProvider, Reservation,
};
use crate::shared::locks::KeyedLocks;
use crate::shared::time::SharedClock;

/// Claims attempted per reserve call before reporting a lost race
pub const RESERVE_ATTEMPTS: u32 = 2;

fn record_outcome<T>(counter: &'static str, result: &DomainResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(counter, "outcome" => outcome).increment(1);
}

pub struct AllocationEngine {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    user_locks: KeyedLocks<i32>,
}

impl AllocationEngine {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        Self {
            repos,
            clock,
            user_locks: KeyedLocks::new(),
        }
    }

    /// Claim the lowest free spot of `lot_id` for `user_id`.
    ///
    /// Errors: `Validation` for a short vehicle number, `NotFound` for an
    /// unknown lot, `Conflict` when the user already parks somewhere or the
    /// claim kept losing races, `NotAvailable` when the lot is full.
    pub async fn reserve(
        &self,
        lot_id: i32,
        user_id: i32,
        vehicle_number: &str,
    ) -> DomainResult<Allocation> {
        let result = self.try_reserve(lot_id, user_id, vehicle_number).await;
        record_outcome("parking_reservations_total", &result);
        result
    }

    async fn try_reserve(
        &self,
        lot_id: i32,
        user_id: i32,
        vehicle_number: &str,
    ) -> DomainResult<Allocation> {
        let vehicle_number = validate_vehicle_number(vehicle_number)?;
        let lot = self
            .repos
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", "id", lot_id))?;

        let _guard = self.user_locks.lock(user_id).await;

        if let Some(active) = self
            .repos
            .reservations()
            .find_active_for_user(user_id)
            .await?
        {
            return Err(DomainError::Conflict(format!(
                "user already has active reservation {}",
                active.id
            )));
        }

        for attempt in 1..=RESERVE_ATTEMPTS {
            let spot = self
                .repos
                .spots()
                .find_available(lot_id)
                .await?
                .ok_or(DomainError::NotAvailable(lot_id))?;

            let request = NewReservation::new(&spot, user_id, &vehicle_number, self.clock.now())?;
            match self.repos.allocations().claim_and_open(request).await? {
                ClaimOutcome::Claimed(reservation) => {
                    info!(
                        lot_id,
                        spot_id = reservation.spot_id,
                        user_id,
                        reservation_id = reservation.id,
                        "🅿️ Spot claimed"
                    );
                    return Ok(Allocation { reservation, lot });
                }
                ClaimOutcome::Lost => {
                    warn!(lot_id, spot_id = spot.id, user_id, attempt, "Lost allocation race");
                }
            }
        }

        Err(DomainError::Conflict("lost allocation race".to_string()))
    }

    /// Close a reservation and free its spot.
    ///
    /// With `reservation_id` the given reservation is closed, otherwise the
    /// user's open one. The cost is computed once, from the lot's current
    /// price and the clock's time at release.
    pub async fn release(
        &self,
        reservation_id: Option<i32>,
        user_id: i32,
    ) -> DomainResult<Release> {
        let result = self.try_release(reservation_id, user_id).await;
        record_outcome("parking_releases_total", &result);
        result
    }

    async fn try_release(
        &self,
        reservation_id: Option<i32>,
        user_id: i32,
    ) -> DomainResult<Release> {
        let _guard = self.user_locks.lock(user_id).await;

        let reservation = self.releasable(reservation_id, user_id).await?;
        let lot = self
            .repos
            .lots()
            .find_by_id(reservation.lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", "id", reservation.lot_id))?;

        let ended_at = self.clock.now();
        let bill = compute_bill(reservation.started_at, ended_at, lot.price_per_hour)?;

        let closed = self
            .repos
            .allocations()
            .close_and_free(reservation.id, user_id, ended_at, bill.cost)
            .await?;

        info!(
            lot_id = lot.id,
            spot_id = closed.spot_id,
            user_id,
            reservation_id = closed.id,
            billed_hours = bill.billed_hours,
            cost = %bill.cost,
            "Reservation closed"
        );

        Ok(Release {
            reservation: closed,
            billed_hours: bill.billed_hours,
            cost: bill.cost,
        })
    }

    async fn releasable(
        &self,
        reservation_id: Option<i32>,
        user_id: i32,
    ) -> DomainResult<Reservation> {
        match reservation_id {
            Some(id) => {
                let reservation = self
                    .repos
                    .reservations()
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;
                reservation.ensure_releasable_by(user_id)?;
                Ok(reservation)
            }
            None => self
                .repos
                .reservations()
                .find_active_for_user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Reservation", "user_id", user_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::domain::{LotChanges, NewLot, SpotStatus};
    use crate::infrastructure::InMemoryRepositoryProvider;
    use crate::shared::time::ManualClock;

    struct Fixture {
        repos: Arc<dyn RepositoryProvider>,
        clock: Arc<ManualClock>,
        engine: Arc<AllocationEngine>,
    }

    fn fixture() -> Fixture {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let engine = Arc::new(AllocationEngine::new(repos.clone(), clock.clone()));
        Fixture {
            repos,
            clock,
            engine,
        }
    }

    async fn lot(repos: &Arc<dyn RepositoryProvider>, price: &str, capacity: i32) -> i32 {
        repos
            .lots()
            .create(
                NewLot {
                    name: "Central Plaza".into(),
                    address: "12 MG Road".into(),
                    postal_code: "560001".into(),
                    price_per_hour: price.parse().unwrap(),
                    capacity,
                },
                Utc::now(),
            )
            .await
            .unwrap()
            .id
    }

    async fn spot_status(repos: &Arc<dyn RepositoryProvider>, spot_id: i32) -> SpotStatus {
        repos.spots().find_by_id(spot_id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn reserve_then_release_bills_started_hours() {
        let f = fixture();
        let lot_id = lot(&f.repos, "20.00", 1).await;

        let allocation = f.engine.reserve(lot_id, 1, "KA01AB1234").await.unwrap();
        let spot_id = allocation.reservation.spot_id;
        assert_eq!(allocation.lot.id, lot_id);
        assert_eq!(spot_status(&f.repos, spot_id).await, SpotStatus::Occupied);

        let again = f.engine.reserve(lot_id, 1, "KA01AB1234").await;
        assert!(matches!(again, Err(DomainError::Conflict(_))));

        f.clock.advance(Duration::minutes(90));
        let release = f.engine.release(None, 1).await.unwrap();
        assert_eq!(release.billed_hours, 2);
        assert_eq!(release.cost, Decimal::new(4000, 2));
        assert_eq!(release.reservation.cost, Some(Decimal::new(4000, 2)));
        assert!(release.reservation.ended_at.unwrap() > release.reservation.started_at);
        assert_eq!(spot_status(&f.repos, spot_id).await, SpotStatus::Available);
    }

    #[tokio::test]
    async fn billing_boundaries() {
        let f = fixture();
        let lot_id = lot(&f.repos, "20.00", 1).await;

        f.engine.reserve(lot_id, 1, "KA01AB1234").await.unwrap();
        f.clock.advance(Duration::seconds(1));
        assert_eq!(f.engine.release(None, 1).await.unwrap().cost, Decimal::new(2000, 2));

        f.engine.reserve(lot_id, 1, "KA01AB1234").await.unwrap();
        f.clock.advance(Duration::minutes(61));
        assert_eq!(f.engine.release(None, 1).await.unwrap().cost, Decimal::new(4000, 2));
    }

    #[tokio::test]
    async fn reserve_validates_before_touching_storage() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 1).await;

        let short = f.engine.reserve(lot_id, 1, " AB12 ").await;
        assert!(matches!(short, Err(DomainError::Validation(_))));

        let unknown = f.engine.reserve(999, 1, "KA01AB1234").await;
        assert!(matches!(unknown, Err(DomainError::NotFound { .. })));

        assert!(f.repos.reservations().find_all().await.unwrap().is_empty());
        assert!(f.repos.spots().find_available(lot_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn full_lot_reports_not_available() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 1).await;
        f.engine.reserve(lot_id, 1, "KA01AB1234").await.unwrap();

        let err = f.engine.reserve(lot_id, 2, "KA02CD5678").await.unwrap_err();
        assert!(matches!(err, DomainError::NotAvailable(id) if id == lot_id));
    }

    #[tokio::test]
    async fn lowest_spot_is_picked_first() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 3).await;
        let spots = f.repos.spots().find_by_lot(lot_id).await.unwrap();

        let a = f.engine.reserve(lot_id, 1, "KA01AB1234").await.unwrap();
        let b = f.engine.reserve(lot_id, 2, "KA02CD5678").await.unwrap();
        assert_eq!(a.reservation.spot_id, spots[0].id);
        assert_eq!(b.reservation.spot_id, spots[1].id);
    }

    #[tokio::test]
    async fn release_by_id_checks_owner_and_state() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 2).await;
        let id = f
            .engine
            .reserve(lot_id, 1, "KA01AB1234")
            .await
            .unwrap()
            .reservation
            .id;

        let stranger = f.engine.release(Some(id), 2).await;
        assert!(matches!(stranger, Err(DomainError::Authorization(_))));

        f.clock.advance(Duration::minutes(10));
        let first = f.engine.release(Some(id), 1).await.unwrap();
        assert_eq!(first.cost, Decimal::new(1000, 2));

        let second = f.engine.release(Some(id), 1).await;
        assert!(matches!(second, Err(DomainError::InvalidState(_))));

        let stored = f.repos.reservations().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.cost, first.reservation.cost);

        let missing = f.engine.release(Some(404), 1).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn release_without_active_reservation_is_not_found() {
        let f = fixture();
        let err = f.engine.release(None, 7).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn release_uses_current_lot_price() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 1).await;
        f.engine.reserve(lot_id, 1, "KA01AB1234").await.unwrap();

        let repriced = LotChanges {
            price_per_hour: Some(Decimal::new(1550, 2)),
            ..Default::default()
        };
        f.repos.lots().update(lot_id, repriced, Utc::now()).await.unwrap();

        f.clock.advance(Duration::minutes(30));
        assert_eq!(f.engine.release(None, 1).await.unwrap().cost, Decimal::new(1550, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_reserves_on_single_spot_yield_one_winner() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 1).await;

        let handles: Vec<_> = (1..=16)
            .map(|user_id| {
                let engine = f.engine.clone();
                tokio::spawn(async move { engine.reserve(lot_id, user_id, "KA01AB1234").await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(DomainError::NotAvailable(_)) | Err(DomainError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(f.repos.reservations().find_active().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_user_cannot_hold_two_spots() {
        let f = fixture();
        let lots = [
            lot(&f.repos, "10.00", 2).await,
            lot(&f.repos, "10.00", 2).await,
            lot(&f.repos, "10.00", 2).await,
        ];

        let handles: Vec<_> = lots
            .iter()
            .map(|&lot_id| {
                let engine = f.engine.clone();
                tokio::spawn(async move { engine.reserve(lot_id, 42, "KA01AB1234").await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let occupied = f
            .repos
            .spots()
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.status == SpotStatus::Occupied)
            .count();
        assert_eq!(occupied, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_release_bills_once() {
        let f = fixture();
        let lot_id = lot(&f.repos, "10.00", 1).await;
        let id = f
            .engine
            .reserve(lot_id, 1, "KA01AB1234")
            .await
            .unwrap()
            .reservation
            .id;
        f.clock.advance(Duration::minutes(5));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = f.engine.clone();
                tokio::spawn(async move { engine.release(Some(id), 1).await })
            })
            .collect();

        let mut closed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => closed += 1,
                Err(e) => assert!(matches!(e, DomainError::InvalidState(_))),
            }
        }
        assert_eq!(closed, 1);
    }
}
