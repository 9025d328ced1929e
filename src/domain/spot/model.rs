//! Spot domain entity

use crate::domain::lot::Lot;
use crate::domain::reservation::Reservation;

/// Occupancy status of a spot.
///
/// `Occupied` holds exactly when the spot has one open reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpotStatus {
    #[default]
    Available,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Available" => Some(Self::Available),
            "Occupied" => Some(Self::Occupied),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spot {
    pub id: i32,
    pub lot_id: i32,
    pub status: SpotStatus,
}

impl Spot {
    pub fn new(id: i32, lot_id: i32) -> Self {
        Self {
            id,
            lot_id,
            status: SpotStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }
}

/// A spot with its lot and, when occupied, the open reservation
#[derive(Debug, Clone)]
pub struct SpotDetail {
    pub spot: Spot,
    pub lot: Lot,
    pub active_reservation: Option<Reservation>,
}
