//! Reservation domain entity

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::lot::Lot;
use crate::domain::spot::Spot;
use crate::shared::errors::{DomainError, DomainResult};

/// Shortest accepted vehicle registration, after trimming
pub const MIN_VEHICLE_NUMBER_LEN: usize = 6;
pub const MAX_VEHICLE_NUMBER_LEN: usize = 32;

/// Derived lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// No end time recorded yet
    Active,
    /// Closed with end time and cost
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occupancy reservation
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i32,
    pub spot_id: i32,
    /// Lot of the spot at reservation time; kept for history after the
    /// lot is gone
    pub lot_id: i32,
    pub user_id: i32,
    pub vehicle_number: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the reservation is active
    pub ended_at: Option<DateTime<Utc>>,
    /// Set together with `ended_at`, never negative
    pub cost: Option<Decimal>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn status(&self) -> ReservationStatus {
        if self.is_active() {
            ReservationStatus::Active
        } else {
            ReservationStatus::Completed
        }
    }

    /// Length of a closed stay
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Ownership first, then state: a stranger gets `Authorization` even
    /// for a closed reservation.
    pub fn ensure_releasable_by(&self, user_id: i32) -> DomainResult<()> {
        if self.user_id != user_id {
            return Err(DomainError::Authorization(format!(
                "reservation {} belongs to another user",
                self.id
            )));
        }
        if !self.is_active() {
            return Err(DomainError::InvalidState(format!(
                "reservation {} is already closed",
                self.id
            )));
        }
        Ok(())
    }
}

/// Trim and check a vehicle registration number.
pub fn validate_vehicle_number(raw: &str) -> DomainResult<String> {
    let vehicle = raw.trim();
    let len = vehicle.chars().count();
    if len < MIN_VEHICLE_NUMBER_LEN {
        return Err(DomainError::Validation(format!(
            "vehicle_number must be at least {} characters",
            MIN_VEHICLE_NUMBER_LEN
        )));
    }
    if len > MAX_VEHICLE_NUMBER_LEN {
        return Err(DomainError::Validation(format!(
            "vehicle_number must be at most {} characters",
            MAX_VEHICLE_NUMBER_LEN
        )));
    }
    Ok(vehicle.to_string())
}

/// A reservation about to be opened on a specific spot
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_id: i32,
    pub vehicle_number: String,
    pub started_at: DateTime<Utc>,
}

impl NewReservation {
    pub fn new(
        spot: &Spot,
        user_id: i32,
        vehicle_number: &str,
        started_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            spot_id: spot.id,
            lot_id: spot.lot_id,
            user_id,
            vehicle_number: validate_vehicle_number(vehicle_number)?,
            started_at,
        })
    }

    pub fn into_reservation(self, id: i32) -> Reservation {
        Reservation {
            id,
            spot_id: self.spot_id,
            lot_id: self.lot_id,
            user_id: self.user_id,
            vehicle_number: self.vehicle_number,
            started_at: self.started_at,
            ended_at: None,
            cost: None,
        }
    }
}

/// Result of a successful reserve: the new reservation and its lot
#[derive(Debug, Clone)]
pub struct Allocation {
    pub reservation: Reservation,
    pub lot: Lot,
}

/// Result of a successful release
#[derive(Debug, Clone)]
pub struct Release {
    pub reservation: Reservation,
    pub billed_hours: i64,
    pub cost: Decimal,
}

// ── Tests ──────────────────────────────────────────────────────
