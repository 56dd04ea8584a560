// state/recalc.rs
// Re-derives aggregates and denormalized copies from scratch. Both passes are
// idempotent and read only current store contents.

use std::collections::HashMap;

use super::store::EntityStore;

/// Runs the per-period and per-client passes.
pub fn recalculate(store: &mut EntityStore) {
    recalculate_periods(store);
    recalculate_clients(store);
}

/// Period totals and period names copied onto consumption records.
pub fn recalculate_periods(store: &mut EntityStore) {
    let mut by_period: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, record) in store.consumption.iter().enumerate() {
        by_period.entry(record.period_id.as_str()).or_default().push(index);
    }

    let mut updates = Vec::with_capacity(store.periods.len());
    for (period_index, period) in store.periods.iter().enumerate() {
        let matched = by_period.get(period.id.as_str()).cloned().unwrap_or_default();
        updates.push((period_index, matched));
    }

    for (period_index, matched) in updates {
        let total = matched
            .iter()
            .map(|&i| store.consumption[i].consumption_kwh)
            .sum::<f64>();
        let name = store.periods[period_index].name.clone();
        store.periods[period_index].total_consumption = total;
        for i in matched {
            store.consumption[i].period_name = name.clone();
        }
    }
}

/// Client copies on consumption and pro-ration records, plus average consumption.
pub fn recalculate_clients(store: &mut EntityStore) {
    let consumption_by_code = index_by(store.consumption.iter().map(|c| c.code.as_str()));
    let prorations_by_code = index_by(store.prorations.iter().map(|p| p.code.as_str()));

    let mut updates = Vec::with_capacity(store.clients.len());
    for (client_index, client) in store.clients.iter().enumerate() {
        let records = consumption_by_code
            .get(client.code.as_str())
            .cloned()
            .unwrap_or_default();
        let prorations = prorations_by_code
            .get(client.code.as_str())
            .cloned()
            .unwrap_or_default();
        updates.push((client_index, records, prorations));
    }

    for (client_index, records, prorations) in updates {
        let client = store.clients[client_index].clone();

        for &i in &records {
            let record = &mut store.consumption[i];
            record.client_name = client.name.clone();
            record.warehouse = client.warehouse.clone();
            record.unit = client.unit.clone();
            record.status = client.status;
        }

        for &i in &prorations {
            let charge = &mut store.prorations[i];
            charge.client_name = client.name.clone();
            charge.warehouse = client.warehouse.clone();
            charge.unit = client.unit.clone();
            charge.status = client.status;
            charge.address = client.address.clone();
            charge.tax_id = client.tax_id.clone();
            charge.phone = client.phone.clone();
            charge.meter_factor = client.meter_factor;
        }

        store.clients[client_index].average_consumption = if records.is_empty() {
            0.0
        } else {
            let total: f64 = records
                .iter()
                .map(|&i| store.consumption[i].consumption_kwh)
                .sum();
            total / records.len() as f64
        };
    }
}

fn index_by<'a>(keys: impl Iterator<Item = &'a str>) -> HashMap<&'a str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, key) in keys.enumerate() {
        index.entry(key).or_default().push(position);
    }
    index
}
