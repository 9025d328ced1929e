//! Lot aggregate
//!
//! A priced parking facility and the capacity it declares.

pub mod model;
pub mod repository;

pub use model::{Lot, LotChanges, LotFilter, LotOccupancy, LotUpdate, NewLot};
pub use repository::LotRepository;
