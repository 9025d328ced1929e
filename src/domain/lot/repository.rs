//! Lot repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Lot, LotChanges, LotUpdate, NewLot};
use crate::domain::DomainResult;

#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Insert the lot and `capacity` Available spots in one unit.
    async fn create(&self, lot: NewLot, created_at: DateTime<Utc>) -> DomainResult<Lot>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>>;

    /// All lots ordered by id
    async fn find_all(&self) -> DomainResult<Vec<Lot>>;

    async fn count(&self) -> DomainResult<u64>;

    /// Apply `changes` to the stored lot and append the capacity growth as
    /// Available spots stamped `at`.
    ///
    /// Reading the lot, applying the changes and appending spots form one
    /// unit, so concurrent updates never append the same growth twice. Only
    /// the fields set in `changes` are written.
    async fn update(
        &self,
        id: i32,
        changes: LotChanges,
        at: DateTime<Utc>,
    ) -> DomainResult<LotUpdate>;

    /// Remove the lot and its spots unless one of them is Occupied.
    ///
    /// Fails with `NotFound` for an unknown id and `Conflict` while any
    /// spot is occupied; the check and the delete are atomic.
    async fn delete_if_idle(&self, id: i32) -> DomainResult<()>;
}
