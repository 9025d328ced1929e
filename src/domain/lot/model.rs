//! Lot domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::money::round_money;

/// Parking lot
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub id: i32,
    /// Display name of the location
    pub name: String,
    pub address: String,
    pub postal_code: String,
    /// Price per started hour, two fractional digits
    pub price_per_hour: Decimal,
    /// Declared capacity. Lowering it never removes spots.
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl Lot {
    /// Case-insensitive substring match on name, address and postal code.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.address, &self.postal_code]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Apply an update in place and return how many spots must be appended.
    ///
    /// Only growth materializes spots; shrinking just records the new
    /// declared capacity.
    pub fn apply(&mut self, changes: LotChanges) -> DomainResult<i32> {
        let mut next = self.clone();
        if let Some(name) = changes.name {
            next.name = required_text("name", name)?;
        }
        if let Some(address) = changes.address {
            next.address = required_text("address", address)?;
        }
        if let Some(postal_code) = changes.postal_code {
            next.postal_code = required_text("postal_code", postal_code)?;
        }
        if let Some(price) = changes.price_per_hour {
            next.price_per_hour = validate_price(price)?;
        }

        let mut added = 0;
        if let Some(capacity) = changes.capacity {
            let capacity = validate_capacity(capacity)?;
            added = (capacity - next.capacity).max(0);
            next.capacity = capacity;
        }

        *self = next;
        Ok(added)
    }
}

/// Result of a stored lot update
#[derive(Debug, Clone, PartialEq)]
pub struct LotUpdate {
    pub lot: Lot,
    /// Spots appended by this update, measured against the stored capacity
    pub added_spots: i32,
}

/// Input for creating a lot
#[derive(Debug, Clone)]
pub struct NewLot {
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub price_per_hour: Decimal,
    pub capacity: i32,
}

impl NewLot {
    /// Check and normalize the input; the price is rounded to cents.
    pub fn validated(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("name", self.name)?,
            address: required_text("address", self.address)?,
            postal_code: required_text("postal_code", self.postal_code)?,
            price_per_hour: validate_price(self.price_per_hour)?,
            capacity: validate_capacity(self.capacity)?,
        })
    }
}

/// Partial update of a lot; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct LotChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub capacity: Option<i32>,
}

/// Listing filter
#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    /// Substring searched in name, address and postal code
    pub text: Option<String>,
    /// Only lots where this user holds or has held a reservation
    pub user_id: Option<i32>,
}

/// Available/occupied counts for one lot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotOccupancy {
    pub lot_id: i32,
    pub name: String,
    pub capacity: i32,
    pub available: u32,
    pub occupied: u32,
}

impl LotOccupancy {
    pub fn total(&self) -> u32 {
        self.available + self.occupied
    }
}

fn required_text(field: &str, value: String) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub fn validate_price(price: Decimal) -> DomainResult<Decimal> {
    let price = round_money(price);
    if price <= Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "price_per_hour must be positive, got {}",
            price
        )));
    }
    Ok(price)
}

pub fn validate_capacity(capacity: i32) -> DomainResult<i32> {
    if capacity <= 0 {
        return Err(DomainError::Validation(format!(
            "capacity must be positive, got {}",
            capacity
        )));
    }
    Ok(capacity)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_lot() -> Lot {
        Lot {
            id: 1,
            name: "Central Plaza".into(),
            address: "12 MG Road".into(),
            postal_code: "560001".into(),
            price_per_hour: Decimal::from(20),
            capacity: 4,
            created_at: Utc::now(),
        }
    }

    fn new_lot(price: &str, capacity: i32) -> NewLot {
        NewLot {
            name: " Central Plaza ".into(),
            address: "12 MG Road".into(),
            postal_code: "560001".into(),
            price_per_hour: Decimal::from_str(price).unwrap(),
            capacity,
        }
    }

    #[test]
    fn validated_trims_and_rounds() {
        let lot = new_lot("19.999", 3).validated().unwrap();
        assert_eq!(lot.name, "Central Plaza");
        assert_eq!(lot.price_per_hour.to_string(), "20.00");
    }

    #[test]
    fn non_positive_price_is_rejected() {
        assert!(matches!(
            new_lot("0", 3).validated(),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            new_lot("-5.00", 3).validated(),
            Err(DomainError::Validation(_))
        ));
        // rounds down to zero
        assert!(new_lot("0.004", 3).validated().is_err());
    }

    #[test]
    fn non_positive_capacity_is_rejected() {
        assert!(matches!(
            new_lot("10", 0).validated(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut input = new_lot("10", 1);
        input.name = "   ".into();
        assert!(input.validated().is_err());
    }

    #[test]
    fn matches_text_is_case_insensitive() {
        let lot = sample_lot();
        assert!(lot.matches_text("central"));
        assert!(lot.matches_text("mg ROAD"));
        assert!(lot.matches_text("5600"));
        assert!(lot.matches_text(""));
        assert!(!lot.matches_text("airport"));
    }

    #[test]
    fn growing_capacity_reports_delta() {
        let mut lot = sample_lot();
        let added = lot
            .apply(LotChanges {
                capacity: Some(7),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(lot.capacity, 7);
    }

    #[test]
    fn shrinking_capacity_adds_nothing() {
        let mut lot = sample_lot();
        let added = lot
            .apply(LotChanges {
                capacity: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(lot.capacity, 2);
    }

    #[test]
    fn invalid_change_leaves_lot_untouched() {
        let mut lot = sample_lot();
        let err = lot.apply(LotChanges {
            name: Some("Renamed".into()),
            capacity: Some(-1),
            ..Default::default()
        });
        assert!(err.is_err());
        assert_eq!(lot.capacity, 4);
        assert_eq!(lot.name, "Central Plaza");
    }
}
