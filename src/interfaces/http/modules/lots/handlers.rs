//! Lot HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::{AllocationEngine, LotRegistry};
use crate::interfaces::http::common::{
    ActingUser, ApiError, ApiResponse, EmptyData, ValidatedJson,
};
use crate::interfaces::http::modules::reservations::AllocationDto;

use super::dto::*;

/// Application state for lot handlers.
#[derive(Clone)]
pub struct LotAppState {
    pub registry: Arc<LotRegistry>,
    pub engine: Arc<AllocationEngine>,
    pub currency: Arc<str>,
}

#[utoipa::path(
    get,
    path = "/api/v1/lots",
    tag = "Lots",
    params(LotQuery),
    responses(
        (status = 200, description = "Lots ordered by id", body = ApiResponse<Vec<LotDto>>)
    )
)]
pub async fn list_lots(
    State(state): State<LotAppState>,
    Query(query): Query<LotQuery>,
) -> Result<Json<ApiResponse<Vec<LotDto>>>, ApiError> {
    let lots = state.registry.list_lots(&query.into()).await?;
    Ok(Json(ApiResponse::success(
        lots.into_iter()
            .map(|l| LotDto::from_domain(l, &state.currency))
            .collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots",
    tag = "Lots",
    request_body = CreateLotRequest,
    responses(
        (status = 201, description = "Lot created with its spots", body = ApiResponse<LotDto>),
        (status = 422, description = "Invalid price, capacity or text")
    )
)]
pub async fn create_lot(
    State(state): State<LotAppState>,
    ValidatedJson(request): ValidatedJson<CreateLotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LotDto>>), ApiError> {
    let lot = state.registry.create_lot(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LotDto::from_domain(lot, &state.currency))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/summary",
    tag = "Lots",
    responses(
        (status = 200, description = "Available/occupied counts per lot", body = ApiResponse<Vec<LotOccupancyDto>>)
    )
)]
pub async fn lot_summary(
    State(state): State<LotAppState>,
) -> Result<Json<ApiResponse<Vec<LotOccupancyDto>>>, ApiError> {
    let summary = state.registry.lot_summary().await?;
    Ok(Json(ApiResponse::success(
        summary.into_iter().map(LotOccupancyDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{lot_id}",
    tag = "Lots",
    params(("lot_id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Lot details", body = ApiResponse<LotDto>),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn get_lot(
    State(state): State<LotAppState>,
    Path(lot_id): Path<i32>,
) -> Result<Json<ApiResponse<LotDto>>, ApiError> {
    let lot = state.registry.get_lot(lot_id).await?;
    Ok(Json(ApiResponse::success(LotDto::from_domain(lot, &state.currency))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lots/{lot_id}",
    tag = "Lots",
    params(("lot_id" = i32, Path, description = "Lot ID")),
    request_body = UpdateLotRequest,
    responses(
        (status = 200, description = "Lot updated", body = ApiResponse<LotDto>),
        (status = 404, description = "Lot not found"),
        (status = 422, description = "Invalid field value")
    )
)]
pub async fn update_lot(
    State(state): State<LotAppState>,
    Path(lot_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateLotRequest>,
) -> Result<Json<ApiResponse<LotDto>>, ApiError> {
    let lot = state.registry.update_lot(lot_id, request.into()).await?;
    Ok(Json(ApiResponse::success(LotDto::from_domain(lot, &state.currency))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lots/{lot_id}",
    tag = "Lots",
    params(("lot_id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Lot and its spots deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Lot not found"),
        (status = 409, description = "Lot has occupied spots")
    )
)]
pub async fn delete_lot(
    State(state): State<LotAppState>,
    Path(lot_id): Path<i32>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    state.registry.delete_lot(lot_id).await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{lot_id}/spots",
    tag = "Lots",
    params(("lot_id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Spots ordered by id", body = ApiResponse<Vec<SpotDto>>),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn list_lot_spots(
    State(state): State<LotAppState>,
    Path(lot_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<SpotDto>>>, ApiError> {
    let spots = state.registry.list_spots(lot_id).await?;
    Ok(Json(ApiResponse::success(
        spots.into_iter().map(SpotDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots/{lot_id}/reservations",
    tag = "Reservations",
    params(
        ("lot_id" = i32, Path, description = "Lot ID"),
        ("X-User-Id" = i32, Header, description = "Acting user")
    ),
    request_body = ReserveSpotRequest,
    responses(
        (status = 201, description = "Spot claimed", body = ApiResponse<AllocationDto>),
        (status = 404, description = "Lot not found or full"),
        (status = 409, description = "User already parked or allocation race lost"),
        (status = 422, description = "Vehicle number too short")
    )
)]
pub async fn reserve_spot(
    State(state): State<LotAppState>,
    ActingUser(user_id): ActingUser,
    Path(lot_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ReserveSpotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AllocationDto>>), ApiError> {
    let allocation = state
        .engine
        .reserve(lot_id, user_id, &request.vehicle_number)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AllocationDto::from_domain(
            allocation,
            &state.currency,
        ))),
    ))
}
