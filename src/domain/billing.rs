//! Hourly billing
//!
//! Every started hour is charged in full, with a one-hour minimum:
//! `cost = max(1, ceil(elapsed_hours)) * price_per_hour`.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::money::round_money;

const SECONDS_PER_HOUR: i64 = 3_600;

/// Billed hours and the resulting charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bill {
    pub billed_hours: i64,
    pub cost: Decimal,
}

/// Bill a stay from `started_at` to `ended_at` at `price_per_hour`.
pub fn compute_bill(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    price_per_hour: Decimal,
) -> DomainResult<Bill> {
    if ended_at < started_at {
        return Err(DomainError::Validation(
            "end time precedes start time".to_string(),
        ));
    }
    if price_per_hour < Decimal::ZERO {
        return Err(DomainError::Validation(
            "price_per_hour must not be negative".to_string(),
        ));
    }

    let billed_hours = billed_hours(ended_at - started_at);
    Ok(Bill {
        billed_hours,
        cost: round_money(Decimal::from(billed_hours) * price_per_hour),
    })
}

/// Shorthand for [`compute_bill`] when only the amount matters.
pub fn compute_cost(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    price_per_hour: Decimal,
) -> DomainResult<Decimal> {
    compute_bill(started_at, ended_at, price_per_hour).map(|bill| bill.cost)
}

fn billed_hours(elapsed: Duration) -> i64 {
    let secs = elapsed.num_seconds();
    let has_fraction = elapsed > Duration::seconds(secs);
    let mut hours = secs / SECONDS_PER_HOUR;
    if secs % SECONDS_PER_HOUR > 0 || has_fraction {
        hours += 1;
    }
    hours.max(1)
}

/// Render a stay as `"{h}h {m}m"`, or `"{m}m"` under an hour.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let hours = secs / SECONDS_PER_HOUR;
    let minutes = (secs % SECONDS_PER_HOUR) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
