//! Application services

mod allocation;
mod ledger;
mod lot_registry;

pub use allocation::{AllocationEngine, RESERVE_ATTEMPTS};
pub use ledger::ReservationLedger;
pub use lot_registry::LotRegistry;
