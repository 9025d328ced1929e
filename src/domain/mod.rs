//! Domain layer: parking entities, billing rules and repository interfaces.

pub mod billing;
pub mod lot;
pub mod repositories;
pub mod reservation;
pub mod spot;

pub use billing::{compute_bill, compute_cost, format_duration, Bill};
pub use lot::{Lot, LotChanges, LotFilter, LotOccupancy, LotRepository, LotUpdate, NewLot};
pub use repositories::{AllocationStore, ClaimOutcome, RepositoryProvider};
pub use reservation::{
    validate_vehicle_number, Allocation, HistoryCost, HistoryEntry, LotUsage, NewReservation,
    ParkingStats, Release, Reservation, ReservationRepository, ReservationStatus,
    MIN_VEHICLE_NUMBER_LEN,
};
pub use spot::{Spot, SpotDetail, SpotRepository, SpotStatus};

pub use crate::shared::errors::{DomainError, DomainResult};
