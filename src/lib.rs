//! # Parking Service
//!
//! Parking-lot reservation engine: lot capacity management, first-free
//! spot allocation, hourly billing on release and reservation history.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, billing rules and repository traits
//! - **application**: Lot registry, reservation ledger and allocation engine
//! - **infrastructure**: SeaORM (SQLite) and in-memory storage
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Runtime bootstrap shared by the CLI and tests

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{AllocationEngine, LotRegistry, ReservationLedger};

pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

pub use interfaces::http::{create_api_router, ApiDoc, ParkingState};

pub use shared::{DomainError, DomainResult};
