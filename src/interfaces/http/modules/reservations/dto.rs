//! Reservation DTOs

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Allocation, HistoryCost, HistoryEntry, LotUsage, ParkingStats, Release, Reservation,
};
use crate::shared::money::format_money;

/// Cost shown for reservations that are still open
pub const IN_PROGRESS: &str = "in progress";

/// Reservation details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub id: i32,
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_id: i32,
    pub vehicle_number: String,
    /// `Active` or `Completed`
    pub status: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    /// Fixed-point amount; `null` while active
    pub cost: Option<String>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            status: r.status().to_string(),
            id: r.id,
            spot_id: r.spot_id,
            lot_id: r.lot_id,
            user_id: r.user_id,
            vehicle_number: r.vehicle_number,
            started_at: r.started_at.to_rfc3339(),
            ended_at: r.ended_at.map(|t| t.to_rfc3339()),
            cost: r.cost.map(|c| format!("{:.2}", c)),
        }
    }
}

/// A freshly claimed spot
#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationDto {
    pub reservation: ReservationDto,
    pub lot_name: String,
    pub address: String,
    pub price_per_hour: String,
    pub price_display: String,
}

impl AllocationDto {
    pub fn from_domain(a: Allocation, currency: &str) -> Self {
        Self {
            reservation: a.reservation.into(),
            price_per_hour: format!("{:.2}", a.lot.price_per_hour),
            price_display: format_money(a.lot.price_per_hour, currency),
            lot_name: a.lot.name,
            address: a.lot.address,
        }
    }
}

/// Outcome of a release
#[derive(Debug, Serialize, ToSchema)]
pub struct ReleaseDto {
    pub reservation: ReservationDto,
    pub billed_hours: i64,
    pub cost: String,
    pub cost_display: String,
}

impl ReleaseDto {
    pub fn from_domain(r: Release, currency: &str) -> Self {
        Self {
            reservation: r.reservation.into(),
            billed_hours: r.billed_hours,
            cost: format!("{:.2}", r.cost),
            cost_display: format_money(r.cost, currency),
        }
    }
}

/// History row
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryDto {
    pub reservation: ReservationDto,
    /// `null` once the lot has been deleted
    pub lot_name: Option<String>,
    /// e.g. `"2h 5m"`; `null` while active
    pub duration: Option<String>,
    /// Amount with currency, or `"in progress"`
    pub cost: String,
}

impl HistoryEntryDto {
    pub fn from_domain(e: HistoryEntry, currency: &str) -> Self {
        let cost = match e.cost {
            HistoryCost::InProgress => IN_PROGRESS.to_string(),
            HistoryCost::Billed(amount) => format_money(amount, currency),
        };
        Self {
            reservation: e.reservation.into(),
            lot_name: e.lot_name,
            duration: e.duration,
            cost,
        }
    }
}

/// Reservations made by one user in one lot
#[derive(Debug, Serialize, ToSchema)]
pub struct LotUsageDto {
    pub lot_id: i32,
    pub lot_name: Option<String>,
    pub reservations: u32,
}

impl From<LotUsage> for LotUsageDto {
    fn from(u: LotUsage) -> Self {
        Self {
            lot_id: u.lot_id,
            lot_name: u.lot_name,
            reservations: u.reservations,
        }
    }
}

/// System-wide totals
#[derive(Debug, Serialize, ToSchema)]
pub struct ParkingStatsDto {
    pub total_lots: u64,
    pub total_spots: u64,
    pub occupied_spots: u64,
    pub total_reservations: u64,
    pub active_reservations: u64,
    pub total_revenue: String,
    pub currency: String,
}

impl ParkingStatsDto {
    pub fn from_domain(s: ParkingStats, currency: &str) -> Self {
        Self {
            total_lots: s.total_lots,
            total_spots: s.total_spots,
            occupied_spots: s.occupied_spots,
            total_reservations: s.total_reservations,
            active_reservations: s.active_reservations,
            total_revenue: format!("{:.2}", s.total_revenue),
            currency: currency.to_string(),
        }
    }
}
