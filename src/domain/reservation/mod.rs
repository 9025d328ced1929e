//! Reservation aggregate
//!
//! The ledger entry for one stay: opened by an allocation, closed exactly
//! once by a release, never deleted.

pub mod model;
pub mod report;
pub mod repository;

pub use model::{
    validate_vehicle_number, Allocation, NewReservation, Release, Reservation,
    ReservationStatus, MIN_VEHICLE_NUMBER_LEN,
};
pub use report::{HistoryCost, HistoryEntry, LotUsage, ParkingStats};
pub use repository::ReservationRepository;
