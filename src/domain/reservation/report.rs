//! Read-side views over the ledger

use rust_decimal::Decimal;

use super::model::Reservation;

/// Cost column of a history row
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryCost {
    /// The reservation is still open
    InProgress,
    Billed(Decimal),
}

impl HistoryCost {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::InProgress => None,
            Self::Billed(cost) => Some(*cost),
        }
    }
}

/// One history row: the reservation with display-ready duration and cost
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub reservation: Reservation,
    /// `None` once the lot has been deleted
    pub lot_name: Option<String>,
    /// `"2h 5m"`, or `None` while in progress
    pub duration: Option<String>,
    pub cost: HistoryCost,
}

/// How many reservations a user has made in one lot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotUsage {
    pub lot_id: i32,
    pub lot_name: Option<String>,
    pub reservations: u32,
}

/// Totals across the whole system
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingStats {
    pub total_lots: u64,
    pub total_spots: u64,
    pub occupied_spots: u64,
    pub total_reservations: u64,
    pub active_reservations: u64,
    /// Sum of all closed reservation costs
    pub total_revenue: Decimal,
}
