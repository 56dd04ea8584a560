use crate::{
    error::{BillingError, BillingResult},
    formula::{self, ProRationTerms, dates_out_of_order},
    models::{ProRatedCharge, ProRationInput},
};

use super::{
    Effects,
    store::{Collection, EntityStore, delete_where, upsert},
};

/// Bills a partial-period charge. Tariffs come from the manual overrides when
/// present, otherwise from the chronologically-last period. No recalculation
/// runs here; pro-ration copies are refreshed by the next client-side pass.
pub fn save_proration(store: &mut EntityStore, mut input: ProRationInput) -> BillingResult<Effects> {
    input.code = input.code.trim().to_string();

    let client = store
        .client_by_code(&input.code)
        .cloned()
        .ok_or_else(|| BillingError::ClientNotFound {
            code: input.code.clone(),
        })?;

    if input.previous_reading > input.current_reading {
        return Err(BillingError::readings_out_of_order());
    }
    if dates_out_of_order(&input.start_date, &input.end_date) {
        return Err(BillingError::dates_out_of_order());
    }

    let tariff = formula::resolve_tariff(
        input.manual_unit_cost,
        input.manual_contribution_pct,
        store.latest_period(),
    );
    let result = formula::prorate(ProRationTerms {
        start_date: &input.start_date,
        end_date: &input.end_date,
        previous_reading: input.previous_reading,
        current_reading: input.current_reading,
        meter_factor: client.meter_factor,
        tax_amount: input.tax_amount,
        other_charges: input.other_charges,
        tariff,
    });

    let charge = ProRatedCharge {
        id: store.id_or_new(Collection::ProRations, input.id.as_deref()),
        code: client.code.clone(),
        warehouse: client.warehouse.clone(),
        unit: client.unit.clone(),
        client_name: client.name.clone(),
        status: client.status,
        start_date: input.start_date,
        end_date: input.end_date,
        previous_reading: input.previous_reading,
        current_reading: input.current_reading,
        contribution_rate: tariff.contribution_rate,
        unit_cost: tariff.unit_cost,
        tax_amount: input.tax_amount,
        other_charges: input.other_charges,
        billed_days: result.billed_days,
        consumption_kwh: result.consumption_kwh,
        partial_tax: result.partial_tax,
        prorated_value: result.prorated_value,
        address: client.address.clone(),
        tax_id: client.tax_id.clone(),
        phone: client.phone.clone(),
        meter_factor: client.meter_factor,
        manual_unit_cost: input.manual_unit_cost,
        manual_contribution_pct: input.manual_contribution_pct,
    };

    upsert(&mut store.prorations, charge);
    store.persist(&[Collection::ProRations]);
    Ok(Effects::broadcast(&[Collection::ProRations]))
}

pub fn delete_proration(store: &mut EntityStore, id: &str) -> BillingResult<Effects> {
    if delete_where(&mut store.prorations, |p| p.id == id) == 0 {
        return Err(BillingError::NotFound {
            entity: "Prorrateo",
            id: id.to_string(),
        });
    }
    store.persist(&[Collection::ProRations]);
    Ok(Effects::broadcast(&[Collection::ProRations]))
}
