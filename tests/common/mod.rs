#![allow(dead_code)]

use std::sync::Arc;

use energiadev::{
    models::{Client, ClientStatus, ConsumptionInput, Period, ProRationInput},
    state::{AppState, BillingPolicy, EntityStore, MemoryBlobStore, save_client, save_consumption, save_period},
};

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

pub fn empty_store() -> EntityStore {
    EntityStore::load(Box::new(MemoryBlobStore::new()))
}

/// Store whose blobs stay inspectable through the returned handle.
pub fn store_with_blobs() -> (EntityStore, Arc<MemoryBlobStore>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    (EntityStore::load(Box::new(blobs.clone())), blobs)
}

pub fn client(id: &str, code: &str, name: &str, meter_factor: f64) -> Client {
    Client {
        id: id.into(),
        code: code.into(),
        name: name.into(),
        warehouse: format!("B-{code}"),
        unit: format!("L-{code}"),
        address: format!("Calle {code}"),
        tax_id: format!("NIT-{code}"),
        phone: "3000000".into(),
        meter_factor,
        status: ClientStatus::Occupied,
        ..Client::default()
    }
}

pub fn period(id: &str, name: &str, unit_cost: f64, contribution_rate: f64) -> Period {
    Period {
        id: id.into(),
        name: name.into(),
        unit_cost,
        contribution_rate,
        start_date: "2024-01-01".into(),
        end_date: "2024-01-31".into(),
        ..Period::default()
    }
}

pub fn reading(id: &str, code: &str, period_id: &str, previous: f64, current: f64) -> ConsumptionInput {
    ConsumptionInput {
        id: Some(id.into()),
        period_id: period_id.into(),
        code: code.into(),
        previous_reading: previous,
        current_reading: current,
        ..ConsumptionInput::default()
    }
}

pub fn proration(id: &str, code: &str, start: &str, end: &str) -> ProRationInput {
    ProRationInput {
        id: Some(id.into()),
        code: code.into(),
        start_date: start.into(),
        end_date: end.into(),
        ..ProRationInput::default()
    }
}

/// Two clients (C1 with factor 2, C2 with factor 1) and two periods.
pub fn seeded_store() -> EntityStore {
    let mut store = empty_store();
    save_client(&mut store, client("c1", "C1", "Ferretería Uno", 2.0)).unwrap();
    save_client(&mut store, client("c2", "C2", "Panadería Dos", 1.0)).unwrap();
    save_period(&mut store, period("p1", "012024", 100.0, 0.1)).unwrap();
    save_period(&mut store, period("p2", "022024", 120.0, 0.05)).unwrap();
    store
}

/// Seeded store plus readings: C1 has 100 kWh in p1 and 40 kWh in p2, C2 has 30 kWh in p1.
pub fn store_with_readings() -> EntityStore {
    let mut store = seeded_store();
    let policy = BillingPolicy::default();
    save_consumption(&mut store, reading("r1", "C1", "p1", 0.0, 50.0), policy).unwrap();
    save_consumption(&mut store, reading("r2", "C1", "p2", 50.0, 70.0), policy).unwrap();
    save_consumption(&mut store, reading("r3", "C2", "p1", 10.0, 40.0), policy).unwrap();
    store
}

pub fn shared_state(store: EntityStore) -> Arc<AppState> {
    Arc::new(AppState::new(store, 64, BillingPolicy::default()))
}
