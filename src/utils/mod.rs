use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Result, SaverlyError};

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Rounds a currency amount to two decimal places, midpoint away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

pub fn parse_amount(value: &str) -> Result<Decimal> {
    value
        .trim()
        .replace(',', ".")
        .parse::<Decimal>()
        .map_err(|e| SaverlyError::Parse(format!("amount `{}`: {}", value, e)))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let raw = value.trim();
    let formats = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d", "%Y.%m.%d"];
    for fmt in formats.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }
    Err(SaverlyError::Parse(format!("unrecognized date `{}`", raw)))
}
