//! In-memory repository provider for development and testing
//!
//! Every compound mutation runs under one write gate, which gives it the
//! same all-or-nothing behavior as a database transaction. Reads go straight
//! to the maps.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::domain::{
    AllocationStore, ClaimOutcome, DomainError, DomainResult, Lot, LotChanges, LotRepository,
    LotUpdate, NewLot, NewReservation, RepositoryProvider, Reservation, ReservationRepository, Spot,
    SpotRepository, SpotStatus,
};

pub struct InMemoryRepositoryProvider {
    lots: DashMap<i32, Lot>,
    spots: DashMap<i32, Spot>,
    reservations: DashMap<i32, Reservation>,
    lot_counter: AtomicI32,
    spot_counter: AtomicI32,
    reservation_counter: AtomicI32,
    write_gate: Mutex<()>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            lots: DashMap::new(),
            spots: DashMap::new(),
            reservations: DashMap::new(),
            lot_counter: AtomicI32::new(1),
            spot_counter: AtomicI32::new(1),
            reservation_counter: AtomicI32::new(1),
            write_gate: Mutex::new(()),
        }
    }

    fn gate(&self) -> DomainResult<MutexGuard<'_, ()>> {
        self.write_gate
            .lock()
            .map_err(|_| DomainError::Storage("in-memory write gate poisoned".to_string()))
    }

    fn add_spots(&self, lot_id: i32, count: i32) {
        for _ in 0..count {
            let id = self.spot_counter.fetch_add(1, Ordering::SeqCst);
            self.spots.insert(id, Spot::new(id, lot_id));
        }
    }

    fn set_spot_status(&self, spot_id: i32, status: SpotStatus) {
        if let Some(mut spot) = self.spots.get_mut(&spot_id) {
            spot.status = status;
        }
    }

    fn newest_first(&self, keep: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        let mut list: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|e| keep(e.value()))
            .map(|e| e.value().clone())
            .collect();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        list
    }

    fn spots_sorted(&self, keep: impl Fn(&Spot) -> bool) -> Vec<Spot> {
        let mut list: Vec<Spot> = self
            .spots
            .iter()
            .filter(|e| keep(e.value()))
            .map(|e| e.value().clone())
            .collect();
        list.sort_by_key(|s| s.id);
        list
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        self
    }

    fn spots(&self) -> &dyn SpotRepository {
        self
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn allocations(&self) -> &dyn AllocationStore {
        self
    }
}

#[async_trait]
impl LotRepository for InMemoryRepositoryProvider {
    async fn create(&self, lot: NewLot, created_at: DateTime<Utc>) -> DomainResult<Lot> {
        let _gate = self.gate()?;
        let id = self.lot_counter.fetch_add(1, Ordering::SeqCst);
        let lot = Lot {
            id,
            name: lot.name,
            address: lot.address,
            postal_code: lot.postal_code,
            price_per_hour: lot.price_per_hour,
            capacity: lot.capacity,
            created_at,
        };
        self.lots.insert(id, lot.clone());
        self.add_spots(id, lot.capacity);
        Ok(lot)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>> {
        Ok(self.lots.get(&id).map(|l| l.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = self.lots.iter().map(|e| e.value().clone()).collect();
        lots.sort_by_key(|l| l.id);
        Ok(lots)
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.lots.len() as u64)
    }

    async fn update(
        &self,
        id: i32,
        changes: LotChanges,
        _at: DateTime<Utc>,
    ) -> DomainResult<LotUpdate> {
        let _gate = self.gate()?;
        let mut lot = self
            .lots
            .get(&id)
            .map(|l| l.clone())
            .ok_or_else(|| DomainError::not_found("Lot", "id", id))?;
        let added_spots = lot.apply(changes)?;
        self.lots.insert(id, lot.clone());
        self.add_spots(id, added_spots);
        Ok(LotUpdate { lot, added_spots })
    }

    async fn delete_if_idle(&self, id: i32) -> DomainResult<()> {
        let _gate = self.gate()?;
        if !self.lots.contains_key(&id) {
            return Err(DomainError::not_found("Lot", "id", id));
        }
        let occupied = self
            .spots
            .iter()
            .any(|s| s.lot_id == id && s.status == SpotStatus::Occupied);
        if occupied {
            return Err(DomainError::Conflict(format!(
                "lot {} has occupied spots",
                id
            )));
        }
        self.spots.retain(|_, s| s.lot_id != id);
        self.lots.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SpotRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Spot>> {
        Ok(self.spots.get(&id).map(|s| s.clone()))
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Spot>> {
        Ok(self.spots_sorted(|s| s.lot_id == lot_id))
    }

    async fn find_all(&self) -> DomainResult<Vec<Spot>> {
        Ok(self.spots_sorted(|_| true))
    }

    async fn find_available(&self, lot_id: i32) -> DomainResult<Option<Spot>> {
        Ok(self
            .spots
            .iter()
            .filter(|s| s.lot_id == lot_id && s.is_available())
            .min_by_key(|s| s.id)
            .map(|s| s.value().clone()))
    }

    async fn delete_if_available(&self, id: i32) -> DomainResult<()> {
        let _gate = self.gate()?;
        let status = self
            .spots
            .get(&id)
            .map(|s| s.status)
            .ok_or_else(|| DomainError::not_found("Spot", "id", id))?;
        if status == SpotStatus::Occupied {
            return Err(DomainError::Conflict(format!("spot {} is occupied", id)));
        }
        self.spots.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn find_active_for_user(&self, user_id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .find(|r| r.user_id == user_id && r.is_active())
            .map(|r| r.value().clone()))
    }

    async fn find_active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .find(|r| r.spot_id == spot_id && r.is_active())
            .map(|r| r.value().clone()))
    }

    async fn find_active(&self) -> DomainResult<Vec<Reservation>> {
        Ok(self.newest_first(|r| r.is_active()))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        Ok(self.newest_first(|r| r.user_id == user_id))
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        Ok(self.newest_first(|_| true))
    }
}

#[async_trait]
impl AllocationStore for InMemoryRepositoryProvider {
    async fn claim_and_open(&self, reservation: NewReservation) -> DomainResult<ClaimOutcome> {
        let _gate = self.gate()?;

        let claimable = self
            .spots
            .get(&reservation.spot_id)
            .map(|s| s.is_available())
            .unwrap_or(false);
        if !claimable {
            return Ok(ClaimOutcome::Lost);
        }

        for open in self.reservations.iter().filter(|r| r.is_active()) {
            if open.spot_id == reservation.spot_id {
                return Err(DomainError::Conflict(format!(
                    "spot {} already has an active reservation",
                    reservation.spot_id
                )));
            }
            if open.user_id == reservation.user_id {
                return Err(DomainError::Conflict(
                    "user already has active reservation".to_string(),
                ));
            }
        }

        let id = self.reservation_counter.fetch_add(1, Ordering::SeqCst);
        let reservation = reservation.into_reservation(id);
        self.set_spot_status(reservation.spot_id, SpotStatus::Occupied);
        self.reservations.insert(id, reservation.clone());
        Ok(ClaimOutcome::Claimed(reservation))
    }

    async fn close_and_free(
        &self,
        reservation_id: i32,
        user_id: i32,
        ended_at: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation> {
        let _gate = self.gate()?;

        let closed = {
            let mut entry = self
                .reservations
                .get_mut(&reservation_id)
                .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;
            if !entry.is_active() || entry.user_id != user_id {
                return Err(DomainError::InvalidState(format!(
                    "reservation {} is not open for user {}",
                    reservation_id, user_id
                )));
            }
            entry.ended_at = Some(ended_at);
            entry.cost = Some(cost);
            entry.clone()
        };

        self.set_spot_status(closed.spot_id, SpotStatus::Available);
        Ok(closed)
    }
}
