pub mod services;

// Re-export key types for convenience
pub use services::{AllocationEngine, LotRegistry, ReservationLedger, RESERVE_ATTEMPTS};
