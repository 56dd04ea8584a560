use crate::{
    error::{BillingError, BillingResult},
    formula::{dates_out_of_order, inclusive_day_count},
    models::Period,
};

use super::{
    Effects,
    recalc::recalculate,
    store::{Collection, EntityStore, delete_where, upsert},
};

pub fn save_period(store: &mut EntityStore, mut period: Period) -> BillingResult<Effects> {
    if dates_out_of_order(&period.start_date, &period.end_date) {
        return Err(BillingError::dates_out_of_order());
    }

    period.id = store.id_or_new(Collection::Periods, Some(period.id.as_str()));
    period.name = period.name.trim().to_string();
    period.billed_days = inclusive_day_count(&period.start_date, &period.end_date);
    period.total_consumption = store
        .period_by_id(&period.id)
        .map(|existing| existing.total_consumption)
        .unwrap_or(0.0);

    upsert(&mut store.periods, period);
    store.sort_periods();
    recalculate(store);

    let affected = [
        Collection::Periods,
        Collection::Consumption,
        Collection::ProRations,
    ];
    store.persist(&affected);
    Ok(Effects::broadcast(&affected))
}

/// Removes a period and its consumption records. Unknown ids remove nothing.
pub fn delete_period(store: &mut EntityStore, id: &str) -> BillingResult<Effects> {
    delete_where(&mut store.consumption, |c| c.period_id == id);
    delete_where(&mut store.periods, |p| p.id == id);

    recalculate(store);

    let affected = [
        Collection::Periods,
        Collection::Consumption,
        Collection::Clients,
    ];
    store.persist(&affected);
    Ok(Effects::broadcast(&affected))
}
