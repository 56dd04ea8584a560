use crate::{
    error::{BillingError, BillingResult},
    events::ServerMessage,
    formula::{self, Tariff},
    models::{ConsumptionInput, ConsumptionRecord},
};

use super::{
    BillingPolicy, Effects,
    recalc::recalculate,
    store::{Collection, EntityStore, delete_where, upsert},
};

pub const SAVE_CONSUMPTION_ACK: &str = "save-consumo-success";

/// Validates and bills a consumption record, then refreshes every aggregate.
pub fn save_consumption(
    store: &mut EntityStore,
    mut input: ConsumptionInput,
    policy: BillingPolicy,
) -> BillingResult<Effects> {
    input.code = input.code.trim().to_string();

    let client = store
        .client_by_code(&input.code)
        .cloned()
        .ok_or_else(|| BillingError::ClientNotFound {
            code: input.code.clone(),
        })?;
    let period = store
        .period_by_id(&input.period_id)
        .cloned()
        .ok_or_else(|| BillingError::PeriodNotFound {
            period_id: input.period_id.clone(),
        })?;

    let id = store.id_or_new(Collection::Consumption, input.id.as_deref());

    if store
        .consumption
        .iter()
        .any(|c| c.code == input.code && c.period_id == input.period_id && c.id != id)
    {
        return Err(BillingError::DuplicateConsumption {
            code: input.code,
            period_id: input.period_id,
        });
    }

    if input.previous_reading > input.current_reading {
        return Err(BillingError::readings_out_of_order());
    }

    let consumption_kwh = formula::consumption_kwh(
        input.previous_reading,
        input.current_reading,
        client.meter_factor,
    );
    let billed_value = formula::billed_value(
        consumption_kwh,
        Tariff::from(&period),
        input.tax_amount,
        input.other_charges,
        input.round_to_tens.unwrap_or(policy.round_to_tens_default),
    );

    let record = ConsumptionRecord {
        id,
        period_id: period.id.clone(),
        period_name: period.name.clone(),
        code: client.code.clone(),
        warehouse: client.warehouse.clone(),
        unit: client.unit.clone(),
        client_name: client.name.clone(),
        status: client.status,
        previous_reading: input.previous_reading,
        current_reading: input.current_reading,
        tax_amount: input.tax_amount,
        other_charges: input.other_charges,
        consumption_kwh,
        billed_value,
    };

    upsert(&mut store.consumption, record);
    recalculate(store);

    store.persist(&[
        Collection::Consumption,
        Collection::Periods,
        Collection::Clients,
        Collection::ProRations,
    ]);

    Ok(Effects::broadcast(&[
        Collection::Consumption,
        Collection::Periods,
        Collection::Clients,
        Collection::ProRations,
    ])
    .with_reply(ServerMessage::signal(SAVE_CONSUMPTION_ACK)))
}

/// Removes one record by id. Unknown ids remove nothing.
pub fn delete_consumption(store: &mut EntityStore, id: &str) -> BillingResult<Effects> {
    delete_where(&mut store.consumption, |c| c.id == id);
    recalculate(store);

    let affected = [
        Collection::Consumption,
        Collection::Periods,
        Collection::Clients,
    ];
    store.persist(&affected);
    Ok(Effects::broadcast(&affected))
}
