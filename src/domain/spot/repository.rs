//! Spot repository interface
//!
//! Status transitions are deliberately absent: only
//! [`AllocationStore`](crate::domain::AllocationStore) flips a spot between
//! Available and Occupied, inside the same unit that opens or closes the
//! reservation.

use async_trait::async_trait;

use super::model::Spot;
use crate::domain::DomainResult;

#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Spot>>;

    /// Spots of one lot ordered by id
    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Spot>>;

    /// All spots ordered by id
    async fn find_all(&self) -> DomainResult<Vec<Spot>>;

    /// Lowest-id Available spot of the lot
    async fn find_available(&self, lot_id: i32) -> DomainResult<Option<Spot>>;

    /// Remove the spot unless it is Occupied (`Conflict`).
    async fn delete_if_available(&self, id: i32) -> DomainResult<()>;
}
