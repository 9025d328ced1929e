pub mod health;
pub mod lots;
pub mod metrics;
pub mod request_id;
pub mod reservations;
pub mod spots;
