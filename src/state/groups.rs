use crate::{error::BillingResult, models::InvoiceGroup};

use super::{
    Effects,
    store::{Collection, EntityStore, delete_where, upsert},
};

/// Stores an invoice group as sent. The entry list is a frozen snapshot; only
/// its totals are recomputed.
pub fn save_group(store: &mut EntityStore, mut group: InvoiceGroup) -> BillingResult<Effects> {
    group.id = store.id_or_new(Collection::Groups, Some(group.id.as_str()));
    group.total_consumption = group.entries.iter().map(|e| e.consumption_kwh).sum();
    group.total_billed = group.entries.iter().map(|e| e.billed_value).sum();

    if group.period_name.trim().is_empty() {
        if let Some(period) = store.period_by_id(&group.period_id) {
            group.period_name = period.name.clone();
        }
    }

    upsert(&mut store.groups, group);
    store.persist(&[Collection::Groups]);
    Ok(Effects::broadcast(&[Collection::Groups]))
}

pub fn delete_group(store: &mut EntityStore, id: &str) -> BillingResult<Effects> {
    delete_where(&mut store.groups, |g| g.id == id);
    store.persist(&[Collection::Groups]);
    Ok(Effects::broadcast(&[Collection::Groups]))
}
