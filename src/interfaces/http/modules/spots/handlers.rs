//! Spot HTTP handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::SpotDetail;
use crate::interfaces::http::common::{ApiError, ApiResponse, EmptyData};
use crate::interfaces::http::modules::lots::{LotAppState, SpotDto};
use crate::interfaces::http::modules::reservations::ReservationDto;

/// A spot with its lot and current occupant
#[derive(Debug, Serialize, ToSchema)]
pub struct SpotDetailDto {
    pub spot: SpotDto,
    pub lot_name: String,
    pub price_per_hour: String,
    /// Open reservation while the spot is occupied
    pub active_reservation: Option<ReservationDto>,
}

impl From<SpotDetail> for SpotDetailDto {
    fn from(d: SpotDetail) -> Self {
        Self {
            spot: d.spot.into(),
            lot_name: d.lot.name,
            price_per_hour: format!("{:.2}", d.lot.price_per_hour),
            active_reservation: d.active_reservation.map(ReservationDto::from),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/spots/{spot_id}",
    tag = "Spots",
    params(("spot_id" = i32, Path, description = "Spot ID")),
    responses(
        (status = 200, description = "Spot details", body = ApiResponse<SpotDetailDto>),
        (status = 404, description = "Spot not found")
    )
)]
pub async fn get_spot(
    State(state): State<LotAppState>,
    Path(spot_id): Path<i32>,
) -> Result<Json<ApiResponse<SpotDetailDto>>, ApiError> {
    let detail = state.registry.spot_detail(spot_id).await?;
    Ok(Json(ApiResponse::success(detail.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/spots/{spot_id}",
    tag = "Spots",
    params(("spot_id" = i32, Path, description = "Spot ID")),
    responses(
        (status = 200, description = "Spot deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Spot not found"),
        (status = 409, description = "Spot is occupied")
    )
)]
pub async fn delete_spot(
    State(state): State<LotAppState>,
    Path(spot_id): Path<i32>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    state.registry.delete_spot(spot_id).await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
