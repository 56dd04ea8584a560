// formula.rs
// Billing formulas. Everything here is pure: same inputs, same outputs.

use chrono::{DateTime, NaiveDate};

use crate::models::Period;

/// Reference month length used to apportion the security tax on pro-rations.
pub const REFERENCE_MONTH_DAYS: f64 = 30.0;

/// Unit cost and contribution rate applied to a consumption.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tariff {
    pub unit_cost: f64,
    /// Fraction, e.g. 0.08.
    pub contribution_rate: f64,
}

impl From<&Period> for Tariff {
    fn from(period: &Period) -> Self {
        Self {
            unit_cost: period.unit_cost,
            contribution_rate: period.contribution_rate,
        }
    }
}

/// `(current - previous) * meter_factor`. Reading order is checked by callers.
pub fn consumption_kwh(previous_reading: f64, current_reading: f64, meter_factor: f64) -> f64 {
    (current_reading - previous_reading) * meter_factor
}

/// Full-period billed value, optionally snapped to the nearest multiple of 10.
pub fn billed_value(
    consumption_kwh: f64,
    tariff: Tariff,
    tax_amount: f64,
    other_charges: f64,
    round_to_tens: bool,
) -> f64 {
    let base = consumption_kwh * tariff.unit_cost * (1.0 + tariff.contribution_rate);
    let value = base + tax_amount + other_charges;
    if round_to_tens {
        round_to_multiple_of_ten(value)
    } else {
        value
    }
}

/// Round half up on `value / 10`, then scale back.
pub fn round_to_multiple_of_ten(value: f64) -> f64 {
    (value / 10.0 + 0.5).floor() * 10.0
}

/// Manual overrides win over the fallback period. The manual contribution is a
/// percentage and is converted to a fraction here.
pub fn resolve_tariff(
    manual_unit_cost: Option<f64>,
    manual_contribution_pct: Option<f64>,
    fallback: Option<&Period>,
) -> Tariff {
    let base = fallback.map(Tariff::from).unwrap_or_default();
    Tariff {
        unit_cost: manual_unit_cost.unwrap_or(base.unit_cost),
        contribution_rate: manual_contribution_pct
            .map(|pct| pct / 100.0)
            .unwrap_or(base.contribution_rate),
    }
}

/// Result of a pro-ration over an explicit date range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProRation {
    pub billed_days: i64,
    pub consumption_kwh: f64,
    pub energy_value: f64,
    pub contribution_value: f64,
    pub partial_tax: f64,
    pub prorated_value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProRationTerms<'a> {
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub meter_factor: f64,
    pub tax_amount: f64,
    pub other_charges: f64,
    pub tariff: Tariff,
}

pub fn prorate(terms: ProRationTerms<'_>) -> ProRation {
    let billed_days = inclusive_day_count(terms.start_date, terms.end_date);
    let consumption_kwh = consumption_kwh(
        terms.previous_reading,
        terms.current_reading,
        terms.meter_factor,
    );
    let energy_value = consumption_kwh * terms.tariff.unit_cost;
    let contribution_value = energy_value * terms.tariff.contribution_rate;
    let partial_tax = partial_tax(billed_days, terms.tax_amount);

    ProRation {
        billed_days,
        consumption_kwh,
        energy_value,
        contribution_value,
        partial_tax,
        prorated_value: energy_value + contribution_value + partial_tax + terms.other_charges,
    }
}

/// `(days / 30) * tax`, against a fixed 30-day month.
pub fn partial_tax(billed_days: i64, tax_amount: f64) -> f64 {
    billed_days as f64 * tax_amount / REFERENCE_MONTH_DAYS
}

/// Inclusive number of days between two dates; 0 when either does not parse.
pub fn inclusive_day_count(start: &str, end: &str) -> i64 {
    match (parse_date(start), parse_date(end)) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 0,
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// True when both dates parse and the start falls after the end.
pub fn dates_out_of_order(start: &str, end: &str) -> bool {
    matches!((parse_date(start), parse_date(end)), (Some(s), Some(e)) if s > e)
}
