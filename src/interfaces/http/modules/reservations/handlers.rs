//! Reservation HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::application::{AllocationEngine, ReservationLedger};
use crate::interfaces::http::common::{
    ActingUser, ApiError, ApiResponse, PaginatedResponse, PaginationParams,
};

use super::dto::*;

/// Application state for reservation handlers.
#[derive(Clone)]
pub struct ReservationAppState {
    pub ledger: Arc<ReservationLedger>,
    pub engine: Arc<AllocationEngine>,
    pub currency: Arc<str>,
}

impl ReservationAppState {
    fn entries(&self, entries: Vec<crate::domain::HistoryEntry>) -> Vec<HistoryEntryDto> {
        entries
            .into_iter()
            .map(|e| HistoryEntryDto::from_domain(e, &self.currency))
            .collect()
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "Reservations",
    params(PaginationParams),
    responses(
        (status = 200, description = "All reservations, newest first", body = ApiResponse<PaginatedResponse<HistoryEntryDto>>)
    )
)]
pub async fn list_all_reservations(
    State(state): State<ReservationAppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<HistoryEntryDto>>>, ApiError> {
    let entries = state.ledger.all_history().await?;
    Ok(Json(ApiResponse::success(
        params.paginate(state.entries(entries)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/active",
    tag = "Reservations",
    responses(
        (status = 200, description = "Open reservations: who is parked where", body = ApiResponse<Vec<HistoryEntryDto>>)
    )
)]
pub async fn list_active_reservations(
    State(state): State<ReservationAppState>,
) -> Result<Json<ApiResponse<Vec<HistoryEntryDto>>>, ApiError> {
    let entries = state.ledger.active_reservations().await?;
    Ok(Json(ApiResponse::success(state.entries(entries))))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/release",
    tag = "Reservations",
    params(("X-User-Id" = i32, Header, description = "Acting user")),
    responses(
        (status = 200, description = "Reservation closed and billed", body = ApiResponse<ReleaseDto>),
        (status = 404, description = "No active reservation")
    )
)]
pub async fn release_active(
    State(state): State<ReservationAppState>,
    ActingUser(user_id): ActingUser,
) -> Result<Json<ApiResponse<ReleaseDto>>, ApiError> {
    let release = state.engine.release(None, user_id).await?;
    Ok(Json(ApiResponse::success(ReleaseDto::from_domain(
        release,
        &state.currency,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/release",
    tag = "Reservations",
    params(
        ("reservation_id" = i32, Path, description = "Reservation ID"),
        ("X-User-Id" = i32, Header, description = "Acting user")
    ),
    responses(
        (status = 200, description = "Reservation closed and billed", body = ApiResponse<ReleaseDto>),
        (status = 403, description = "Reservation belongs to another user"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation already closed")
    )
)]
pub async fn release_reservation(
    State(state): State<ReservationAppState>,
    ActingUser(user_id): ActingUser,
    Path(reservation_id): Path<i32>,
) -> Result<Json<ApiResponse<ReleaseDto>>, ApiError> {
    let release = state.engine.release(Some(reservation_id), user_id).await?;
    Ok(Json(ApiResponse::success(ReleaseDto::from_domain(
        release,
        &state.currency,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/reservations",
    tag = "Me",
    params(
        PaginationParams,
        ("X-User-Id" = i32, Header, description = "Acting user")
    ),
    responses(
        (status = 200, description = "Caller's reservations, newest first", body = ApiResponse<PaginatedResponse<HistoryEntryDto>>)
    )
)]
pub async fn my_reservations(
    State(state): State<ReservationAppState>,
    ActingUser(user_id): ActingUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<HistoryEntryDto>>>, ApiError> {
    let entries = state.ledger.history(user_id).await?;
    Ok(Json(ApiResponse::success(
        params.paginate(state.entries(entries)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/reservation",
    tag = "Me",
    params(("X-User-Id" = i32, Header, description = "Acting user")),
    responses(
        (status = 200, description = "Caller's active reservation, or null", body = ApiResponse<ReservationDto>)
    )
)]
pub async fn my_active_reservation(
    State(state): State<ReservationAppState>,
    ActingUser(user_id): ActingUser,
) -> Result<Json<ApiResponse<Option<ReservationDto>>>, ApiError> {
    let active = state.ledger.active_for_user(user_id).await?;
    Ok(Json(ApiResponse::success(active.map(ReservationDto::from))))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/summary",
    tag = "Me",
    params(("X-User-Id" = i32, Header, description = "Acting user")),
    responses(
        (status = 200, description = "Reservation count per lot", body = ApiResponse<Vec<LotUsageDto>>)
    )
)]
pub async fn my_summary(
    State(state): State<ReservationAppState>,
    ActingUser(user_id): ActingUser,
) -> Result<Json<ApiResponse<Vec<LotUsageDto>>>, ApiError> {
    let usage = state.ledger.user_lot_summary(user_id).await?;
    Ok(Json(ApiResponse::success(
        usage.into_iter().map(LotUsageDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Reservations",
    responses(
        (status = 200, description = "System-wide totals", body = ApiResponse<ParkingStatsDto>)
    )
)]
pub async fn parking_stats(
    State(state): State<ReservationAppState>,
) -> Result<Json<ApiResponse<ParkingStatsDto>>, ApiError> {
    let stats = state.ledger.stats().await?;
    Ok(Json(ApiResponse::success(ParkingStatsDto::from_domain(
        stats,
        &state.currency,
    ))))
}
