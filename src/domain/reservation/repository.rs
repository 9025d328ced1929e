//! Reservation repository interface (read side)
//!
//! Reservations are written only through
//! [`AllocationStore`](crate::domain::AllocationStore).

use async_trait::async_trait;

use super::model::Reservation;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// The user's open reservation, if any
    async fn find_active_for_user(&self, user_id: i32) -> DomainResult<Option<Reservation>>;

    /// The spot's open reservation, if any
    async fn find_active_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>>;

    /// Every open reservation, newest first
    async fn find_active(&self) -> DomainResult<Vec<Reservation>>;

    /// A user's reservations ordered by start time descending
    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>>;

    /// All reservations ordered by start time descending
    async fn find_all(&self) -> DomainResult<Vec<Reservation>>;
}
