//! Spot aggregate
//!
//! One allocatable unit of capacity inside a lot.

pub mod model;
pub mod repository;

pub use model::{Spot, SpotDetail, SpotStatus};
pub use repository::SpotRepository;
