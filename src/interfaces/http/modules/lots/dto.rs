//! Lot DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{Lot, LotChanges, LotFilter, LotOccupancy, NewLot, Spot};
use crate::shared::money::format_money;

/// Lot details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct LotDto {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    /// Fixed-point amount, e.g. `"20.00"`
    pub price_per_hour: String,
    /// Amount with currency, e.g. `"20.00 INR"`
    pub price_display: String,
    pub capacity: i32,
    pub created_at: String,
}

impl LotDto {
    pub fn from_domain(lot: Lot, currency: &str) -> Self {
        Self {
            id: lot.id,
            price_per_hour: format!("{:.2}", lot.price_per_hour),
            price_display: format_money(lot.price_per_hour, currency),
            name: lot.name,
            address: lot.address,
            postal_code: lot.postal_code,
            capacity: lot.capacity,
            created_at: lot.created_at.to_rfc3339(),
        }
    }
}

/// Request to create a lot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    /// Price per started hour; accepts a number or a decimal string
    #[schema(value_type = f64, example = 20.0)]
    pub price_per_hour: Decimal,
    /// Number of spots to create
    #[validate(range(min = 1, max = 10000))]
    pub capacity: i32,
}

impl From<CreateLotRequest> for NewLot {
    fn from(r: CreateLotRequest) -> Self {
        NewLot {
            name: r.name,
            address: r.address,
            postal_code: r.postal_code,
            price_per_hour: r.price_per_hour,
            capacity: r.capacity,
        }
    }
}

/// Partial lot update; omitted fields stay unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price_per_hour: Option<Decimal>,
    /// Growing adds spots; shrinking keeps existing ones
    #[validate(range(min = 1, max = 10000))]
    pub capacity: Option<i32>,
}

impl From<UpdateLotRequest> for LotChanges {
    fn from(r: UpdateLotRequest) -> Self {
        LotChanges {
            name: r.name,
            address: r.address,
            postal_code: r.postal_code,
            price_per_hour: r.price_per_hour,
            capacity: r.capacity,
        }
    }
}

/// Lot listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LotQuery {
    /// Case-insensitive match on name, address or postal code
    pub q: Option<String>,
    /// Only lots this user has parked in
    pub user_id: Option<i32>,
}

impl From<LotQuery> for LotFilter {
    fn from(q: LotQuery) -> Self {
        LotFilter {
            text: q.q,
            user_id: q.user_id,
        }
    }
}

/// Spot counts for one lot
#[derive(Debug, Serialize, ToSchema)]
pub struct LotOccupancyDto {
    pub lot_id: i32,
    pub name: String,
    pub capacity: i32,
    pub available: u32,
    pub occupied: u32,
    pub total: u32,
}

impl From<LotOccupancy> for LotOccupancyDto {
    fn from(o: LotOccupancy) -> Self {
        Self {
            total: o.total(),
            lot_id: o.lot_id,
            name: o.name,
            capacity: o.capacity,
            available: o.available,
            occupied: o.occupied,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SpotDto {
    pub id: i32,
    pub lot_id: i32,
    /// `Available` or `Occupied`
    pub status: String,
}

impl From<Spot> for SpotDto {
    fn from(s: Spot) -> Self {
        Self {
            id: s.id,
            lot_id: s.lot_id,
            status: s.status.to_string(),
        }
    }
}

/// Request to park in a lot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReserveSpotRequest {
    /// Vehicle registration number, at least 6 characters
    #[validate(length(min = 6, max = 32))]
    pub vehicle_number: String,
}
