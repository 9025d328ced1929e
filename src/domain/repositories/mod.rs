//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `AllocationStore`: the two atomic units that couple a spot's status
//!   with a reservation's lifecycle

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::lot::LotRepository;
use super::reservation::{NewReservation, Reservation, ReservationRepository};
use super::spot::SpotRepository;
use crate::shared::errors::DomainResult;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let lot = repos.lots().find_by_id(1).await?;
///     let spot = repos.spots().find_available(1).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn lots(&self) -> &dyn LotRepository;
    fn spots(&self) -> &dyn SpotRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn allocations(&self) -> &dyn AllocationStore;
}

// ── AllocationStore ─────────────────────────────────────────────

/// Outcome of an optimistic spot claim
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The spot flipped to Occupied and the reservation was recorded
    Claimed(Reservation),
    /// Another writer took the spot (or it vanished) between the read and
    /// the claim; nothing was written
    Lost,
}

#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Flip the spot Available → Occupied and insert the reservation as one
    /// unit. A spot that is no longer Available yields `Lost`.
    async fn claim_and_open(&self, reservation: NewReservation) -> DomainResult<ClaimOutcome>;

    /// Record end time and cost on the open reservation and flip its spot
    /// back to Available as one unit.
    ///
    /// Fails with `InvalidState` when the reservation is no longer open or
    /// does not belong to `user_id`.
    async fn close_and_free(
        &self,
        reservation_id: i32,
        user_id: i32,
        ended_at: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation>;
}
