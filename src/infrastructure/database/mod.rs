pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmRepositoryProvider;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./parking.db?mode=rwc")
    pub url: String,
    /// Pool size. SQLite serializes writers anyway; one connection keeps
    /// transactions from tripping over each other's locks.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./parking.db?mode=rwc".to_string(),
            max_connections: 1,
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            ..Default::default()
        }
    }

    /// Private in-memory SQLite database, alive as long as the pool
    pub fn sqlite_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections.max(1))
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use sea_orm_migration::MigratorTrait;

    use super::migrator::Migrator;
    use super::*;
    use crate::application::{AllocationEngine, LotRegistry, ReservationLedger};
    use crate::domain::{
        ClaimOutcome, DomainError, HistoryCost, LotChanges, NewLot, NewReservation,
        RepositoryProvider, SpotStatus,
    };
    use crate::shared::time::{ManualClock, SystemClock};

    async fn provider() -> Arc<dyn RepositoryProvider> {
        let db = init_database(&DatabaseConfig::sqlite_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(SeaOrmRepositoryProvider::new(db))
    }

    fn new_lot(price: &str, capacity: i32) -> NewLot {
        NewLot {
            name: "Central Plaza".into(),
            address: "12 MG Road".into(),
            postal_code: "560001".into(),
            price_per_hour: price.parse().unwrap(),
            capacity,
        }
    }

    #[tokio::test]
    async fn lot_lifecycle_round_trips_through_sqlite() {
        let repos = provider().await;
        let opened = Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap();
        let registry = LotRegistry::new(repos.clone(), Arc::new(ManualClock::new(opened)));

        let lot = registry.create_lot(new_lot("20.50", 3)).await.unwrap();
        assert_eq!(lot.price_per_hour, Decimal::new(2050, 2));
        assert_eq!(registry.get_lot(lot.id).await.unwrap().created_at, opened);
        assert_eq!(repos.spots().find_by_lot(lot.id).await.unwrap().len(), 3);

        let updated = registry
            .update_lot(
                lot.id,
                LotChanges {
                    capacity: Some(4),
                    price_per_hour: Some(Decimal::new(1999, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.capacity, 4);

        let stored = registry.get_lot(lot.id).await.unwrap();
        assert_eq!(stored.price_per_hour, Decimal::new(1999, 2));
        assert_eq!(repos.spots().find_by_lot(lot.id).await.unwrap().len(), 4);
        assert_eq!(repos.lots().count().await.unwrap(), 1);

        registry.delete_lot(lot.id).await.unwrap();
        assert!(repos.spots().find_all().await.unwrap().is_empty());
        assert!(matches!(
            registry.delete_lot(lot.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn claim_and_close_keep_spot_and_ledger_in_step() {
        let repos = provider().await;
        let lot = repos.lots().create(new_lot("10.00", 1), Utc::now()).await.unwrap();
        let spot = repos.spots().find_available(lot.id).await.unwrap().unwrap();

        let started = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let request = NewReservation::new(&spot, 1, "KA01AB1234", started).unwrap();
        let ClaimOutcome::Claimed(open) = repos.allocations().claim_and_open(request).await.unwrap()
        else {
            panic!("claim lost");
        };
        assert_eq!(
            repos.spots().find_by_id(spot.id).await.unwrap().unwrap().status,
            SpotStatus::Occupied
        );
        assert!(repos.spots().find_available(lot.id).await.unwrap().is_none());

        let late = NewReservation::new(&spot, 2, "KA01AB9999", started).unwrap();
        assert!(matches!(
            repos.allocations().claim_and_open(late).await.unwrap(),
            ClaimOutcome::Lost
        ));

        let ended = started + Duration::minutes(70);
        let closed = repos
            .allocations()
            .close_and_free(open.id, 1, ended, Decimal::new(2000, 2))
            .await
            .unwrap();
        assert_eq!(closed.ended_at, Some(ended));
        assert_eq!(closed.cost, Some(Decimal::new(2000, 2)));
        assert!(repos.spots().find_by_id(spot.id).await.unwrap().unwrap().is_available());

        let twice = repos
            .allocations()
            .close_and_free(open.id, 1, ended, Decimal::new(2000, 2))
            .await;
        assert!(matches!(twice, Err(DomainError::InvalidState(_))));

        let missing = repos
            .allocations()
            .close_and_free(999, 1, ended, Decimal::ONE)
            .await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn open_reservation_per_user_is_unique_in_the_database() {
        let repos = provider().await;
        let lot = repos.lots().create(new_lot("10.00", 2), Utc::now()).await.unwrap();
        let spots = repos.spots().find_by_lot(lot.id).await.unwrap();

        let first = NewReservation::new(&spots[0], 5, "KA01AB1234", Utc::now()).unwrap();
        repos.allocations().claim_and_open(first).await.unwrap();

        let second = NewReservation::new(&spots[1], 5, "KA01AB1234", Utc::now()).unwrap();
        let err = repos.allocations().claim_and_open(second).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        // the claim was rolled back with the failed insert
        assert!(repos.spots().find_by_id(spots[1].id).await.unwrap().unwrap().is_available());
    }

    #[tokio::test]
    async fn engine_scenario_on_sqlite() {
        let repos = provider().await;
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let engine = AllocationEngine::new(repos.clone(), clock.clone());
        let registry = LotRegistry::new(repos.clone(), clock.clone());
        let ledger = ReservationLedger::new(repos.clone());

        let lot = registry.create_lot(new_lot("20.00", 1)).await.unwrap();
        let allocation = engine.reserve(lot.id, 1, "KA01AB1234").await.unwrap();
        assert!(matches!(
            engine.reserve(lot.id, 1, "KA01AB1234").await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            registry.delete_lot(lot.id).await,
            Err(DomainError::Conflict(_))
        ));

        clock.advance(Duration::minutes(90));
        let release = engine.release(None, 1).await.unwrap();
        assert_eq!(release.cost, Decimal::new(4000, 2));
        assert!(registry
            .spot_detail(allocation.reservation.spot_id)
            .await
            .unwrap()
            .spot
            .is_available());

        let history = ledger.history(1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].cost, HistoryCost::Billed(Decimal::new(4000, 2)));
        assert_eq!(history[0].duration.as_deref(), Some("1h 30m"));

        registry.delete_lot(lot.id).await.unwrap();
        let history = ledger.history(1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].lot_name.is_none());
        assert_eq!(ledger.stats().await.unwrap().total_revenue, Decimal::new(4000, 2));
    }

    fn sqlite_registry(repos: &Arc<dyn RepositoryProvider>) -> Arc<LotRegistry> {
        Arc::new(LotRegistry::new(repos.clone(), Arc::new(SystemClock)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_growth_on_sqlite_appends_delta_once() {
        let repos = provider().await;
        let registry = sqlite_registry(&repos);
        let lot_id = registry.create_lot(new_lot("10.00", 1)).await.unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .update_lot(
                            lot_id,
                            LotChanges {
                                capacity: Some(2),
                                ..Default::default()
                            },
                        )
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().capacity, 2);
        }

        assert_eq!(registry.get_lot(lot_id).await.unwrap().capacity, 2);
        assert_eq!(repos.spots().find_by_lot(lot_id).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_edits_of_different_fields_both_stick() {
        let repos = provider().await;
        let registry = sqlite_registry(&repos);
        let lot_id = registry.create_lot(new_lot("10.00", 1)).await.unwrap().id;

        let rename = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .update_lot(
                        lot_id,
                        LotChanges {
                            name: Some("Central Plaza East".into()),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        let reprice = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .update_lot(
                        lot_id,
                        LotChanges {
                            price_per_hour: Some(Decimal::new(1250, 2)),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        rename.await.unwrap().unwrap();
        reprice.await.unwrap().unwrap();

        let stored = registry.get_lot(lot_id).await.unwrap();
        assert_eq!(stored.name, "Central Plaza East");
        assert_eq!(stored.price_per_hour, Decimal::new(1250, 2));
    }

    #[tokio::test]
    async fn capacity_beyond_one_statement_is_inserted_in_batches() {
        let repos = provider().await;
        let registry = sqlite_registry(&repos);

        let lot = registry.create_lot(new_lot("10.00", 12_000)).await.unwrap();
        assert_eq!(repos.spots().find_by_lot(lot.id).await.unwrap().len(), 12_000);

        registry
            .update_lot(
                lot.id,
                LotChanges {
                    capacity: Some(23_001),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(repos.spots().find_by_lot(lot.id).await.unwrap().len(), 23_001);
    }

    #[tokio::test]
    async fn rejected_update_rolls_back() {
        let repos = provider().await;
        let registry = sqlite_registry(&repos);
        let lot = registry.create_lot(new_lot("10.00", 2)).await.unwrap();

        let err = registry
            .update_lot(
                lot.id,
                LotChanges {
                    name: Some("Renamed".into()),
                    price_per_hour: Some(Decimal::ZERO),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(registry.get_lot(lot.id).await.unwrap().name, "Central Plaza");

        let missing = registry.update_lot(404, LotChanges::default()).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }
}
