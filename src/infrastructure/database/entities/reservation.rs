//! Reservation entity
//!
//! No foreign keys: reservations outlive the spots and lots they reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub spot_id: i32,
    pub lot_id: i32,
    pub user_id: i32,
    pub vehicle_number: String,

    pub started_at: DateTimeUtc,

    /// NULL while the reservation is active
    #[sea_orm(nullable)]
    pub ended_at: Option<DateTimeUtc>,

    /// Charged amount in minor units, written together with `ended_at`
    #[sea_orm(nullable)]
    pub cost_cents: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
