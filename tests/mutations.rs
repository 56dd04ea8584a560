#[path = "common/mod.rs"]
mod common;

use common::{client, close, empty_store, period, proration, reading, seeded_store, store_with_readings};
use energiadev::{
    error::BillingError,
    models::{ConsumptionRecord, CredentialsChange, DefaultValues, InvoiceGroup, LoginRequest, ProRationInput},
    state::{
        BillingPolicy, Collection, SAVE_CONSUMPTION_ACK, change_credentials, delete_client,
        delete_consumption, delete_group, delete_period, delete_proration, save_client,
        save_consumption, save_default_values, save_group, save_period, save_proration,
        verify_login,
    },
};

// clients

#[test]
fn duplicate_client_code_is_rejected() {
    let mut store = seeded_store();
    let err = save_client(&mut store, client("c3", "C1", "Otra", 1.0)).unwrap_err();
    assert_eq!(err, BillingError::DuplicateCode { code: "C1".into() });
    assert_eq!(store.clients.len(), 2);
}

#[test]
fn editing_a_client_keeps_its_code_and_average() {
    let mut store = store_with_readings();
    let effects = save_client(&mut store, client("c1", "C1", "Ferretería Editada", 2.0)).unwrap();

    assert_eq!(store.clients.len(), 2);
    let c1 = store.client_by_id("c1").unwrap();
    assert_eq!(c1.name, "Ferretería Editada");
    assert!(close(c1.average_consumption, 70.0));
    assert!(store
        .consumption
        .iter()
        .filter(|c| c.code == "C1")
        .all(|c| c.client_name == "Ferretería Editada"));
    assert_eq!(
        effects.broadcast,
        vec![Collection::Clients, Collection::Consumption, Collection::ProRations]
    );
}

#[test]
fn new_client_without_id_gets_one() {
    let mut store = empty_store();
    save_client(&mut store, client("", "N1", "Nuevo", 1.0)).unwrap();
    save_client(&mut store, client("", "N2", "Nuevo 2", 1.0)).unwrap();
    assert!(!store.clients[0].id.is_empty());
    assert_ne!(store.clients[0].id, store.clients[1].id);
}

#[test]
fn deleting_a_client_cascades_to_its_records() {
    let mut store = store_with_readings();
    save_proration(&mut store, proration("x1", "C1", "2024-03-01", "2024-03-10")).unwrap();
    save_proration(&mut store, proration("x2", "C2", "2024-03-01", "2024-03-10")).unwrap();

    delete_client(&mut store, "c1").unwrap();

    assert!(store.client_by_code("C1").is_none());
    assert!(store.consumption.iter().all(|c| c.code != "C1"));
    assert!(store.prorations.iter().all(|p| p.code != "C1"));
    assert_eq!(store.prorations.len(), 1);
    // Only C2's 30 kWh remain in p1, and p2 is empty.
    assert!(close(store.period_by_id("p1").unwrap().total_consumption, 30.0));
    assert_eq!(store.period_by_id("p2").unwrap().total_consumption, 0.0);
}

#[test]
fn deleting_an_unknown_client_is_not_found() {
    let mut store = seeded_store();
    let err = delete_client(&mut store, "nope").unwrap_err();
    assert!(matches!(err, BillingError::NotFound { entity: "Cliente", .. }));
}

// periods

#[test]
fn periods_are_kept_in_chronological_order() {
    let mut store = empty_store();
    for (id, name) in [("a", "032024"), ("b", "112023"), ("c", "012024"), ("d", "borrador")] {
        save_period(&mut store, period(id, name, 100.0, 0.1)).unwrap();
    }
    let names: Vec<&str> = store.periods.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["112023", "012024", "032024", "borrador"]);
    assert_eq!(store.latest_period().unwrap().name, "032024");
}

#[test]
fn saving_a_period_counts_billed_days() {
    let store = seeded_store();
    assert_eq!(store.period_by_id("p1").unwrap().billed_days, 31);
}

#[test]
fn period_with_reversed_dates_is_rejected() {
    let mut store = empty_store();
    let mut reversed = period("p1", "012024", 100.0, 0.1);
    reversed.start_date = "2024-02-01".into();
    reversed.end_date = "2024-01-01".into();
    let err = save_period(&mut store, reversed).unwrap_err();
    assert!(matches!(err, BillingError::Validation(_)));
    assert!(store.periods.is_empty());
}

#[test]
fn renaming_a_period_keeps_its_total_and_refreshes_records() {
    let mut store = store_with_readings();
    save_period(&mut store, period("p1", "012025", 100.0, 0.1)).unwrap();
    assert!(close(store.period_by_id("p1").unwrap().total_consumption, 130.0));
    assert!(store
        .consumption
        .iter()
        .filter(|c| c.period_id == "p1")
        .all(|c| c.period_name == "012025"));
    assert_eq!(store.periods.last().unwrap().id, "p1");
}

#[test]
fn deleting_a_period_cascades_and_recomputes_averages() {
    let mut store = store_with_readings();
    let effects = delete_period(&mut store, "p1").unwrap();

    assert!(store.period_by_id("p1").is_none());
    assert!(store.consumption.iter().all(|c| c.period_id != "p1"));
    assert!(close(store.client_by_code("C1").unwrap().average_consumption, 40.0));
    assert_eq!(store.client_by_code("C2").unwrap().average_consumption, 0.0);
    assert!(effects.broadcast.contains(&Collection::Clients));
}

#[test]
fn deleting_an_unknown_period_changes_nothing() {
    let mut store = store_with_readings();
    delete_period(&mut store, "nope").unwrap();
    assert_eq!(store.periods.len(), 2);
    assert_eq!(store.consumption.len(), 3);
}

// consumption

#[test]
fn second_reading_for_same_client_and_period_is_rejected() {
    let mut store = store_with_readings();
    let err = save_consumption(
        &mut store,
        reading("r9", "C1", "p1", 50.0, 60.0),
        BillingPolicy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BillingError::DuplicateConsumption { .. }));
    assert_eq!(store.consumption.len(), 3);
}

#[test]
fn editing_a_reading_replaces_it() {
    let mut store = store_with_readings();
    let effects = save_consumption(
        &mut store,
        reading("r1", "C1", "p1", 0.0, 60.0),
        BillingPolicy::default(),
    )
    .unwrap();

    assert_eq!(store.consumption.len(), 3);
    let r1 = store.consumption.iter().find(|c| c.id == "r1").unwrap();
    assert!(close(r1.consumption_kwh, 120.0));
    assert!(close(store.period_by_id("p1").unwrap().total_consumption, 150.0));
    assert!(close(store.client_by_code("C1").unwrap().average_consumption, 80.0));
    assert_eq!(effects.replies.len(), 1);
    assert_eq!(effects.replies[0].event, SAVE_CONSUMPTION_ACK);
}

#[test]
fn reading_below_previous_is_rejected() {
    let mut store = seeded_store();
    let err = save_consumption(
        &mut store,
        reading("r1", "C1", "p1", 80.0, 50.0),
        BillingPolicy::default(),
    )
    .unwrap_err();
    assert_eq!(err, BillingError::readings_out_of_order());
    assert!(store.consumption.is_empty());
}

#[test]
fn equal_readings_bill_zero_consumption() {
    let mut store = seeded_store();
    save_consumption(
        &mut store,
        reading("r1", "C1", "p1", 50.0, 50.0),
        BillingPolicy::default(),
    )
    .unwrap();
    assert_eq!(store.consumption[0].consumption_kwh, 0.0);
    assert_eq!(store.consumption[0].billed_value, 0.0);
}

#[test]
fn reading_for_unknown_client_or_period_is_rejected() {
    let mut store = seeded_store();
    let policy = BillingPolicy::default();

    let err = save_consumption(&mut store, reading("r1", "ZZ", "p1", 0.0, 1.0), policy).unwrap_err();
    assert_eq!(err, BillingError::ClientNotFound { code: "ZZ".into() });

    let err = save_consumption(&mut store, reading("r1", "C1", "p9", 0.0, 1.0), policy).unwrap_err();
    assert_eq!(err, BillingError::PeriodNotFound { period_id: "p9".into() });
}

#[test]
fn deleting_a_reading_recomputes_aggregates() {
    let mut store = store_with_readings();
    delete_consumption(&mut store, "r1").unwrap();
    assert!(close(store.period_by_id("p1").unwrap().total_consumption, 30.0));
    assert!(close(store.client_by_code("C1").unwrap().average_consumption, 40.0));

    delete_consumption(&mut store, "missing").unwrap();
    assert_eq!(store.consumption.len(), 2);
}

// pro-rations

#[test]
fn proration_falls_back_to_latest_period_tariff() {
    let mut store = seeded_store();
    save_proration(&mut store, proration("x1", "C1", "2024-03-01", "2024-03-15")).unwrap();

    let charge = &store.prorations[0];
    assert_eq!(charge.unit_cost, 120.0);
    assert_eq!(charge.contribution_rate, 0.05);
    assert_eq!(charge.address, "Calle C1");
    assert_eq!(charge.tax_id, "NIT-C1");
    assert_eq!(charge.meter_factor, 2.0);
    assert_eq!(charge.billed_days, 15);
}

#[test]
fn proration_manual_overrides_take_precedence() {
    let mut store = seeded_store();
    let input = ProRationInput {
        previous_reading: 0.0,
        current_reading: 5.0,
        manual_unit_cost: Some(900.0),
        manual_contribution_pct: Some(8.0),
        ..proration("x1", "C1", "2024-03-01", "2024-03-15")
    };
    save_proration(&mut store, input).unwrap();

    let charge = &store.prorations[0];
    assert_eq!(charge.unit_cost, 900.0);
    assert!(close(charge.contribution_rate, 0.08));
    // 5 * 2 = 10 kWh; 10 * 900 = 9000; contribution 720
    assert!(close(charge.prorated_value, 9720.0));
    assert_eq!(charge.manual_unit_cost, Some(900.0));
}

#[test]
fn proration_without_periods_uses_zero_tariff() {
    let mut store = empty_store();
    save_client(&mut store, client("c1", "C1", "Uno", 1.0)).unwrap();
    let input = ProRationInput {
        current_reading: 10.0,
        other_charges: 300.0,
        ..proration("x1", "C1", "2024-03-01", "2024-03-15")
    };
    save_proration(&mut store, input).unwrap();
    assert_eq!(store.prorations[0].unit_cost, 0.0);
    assert!(close(store.prorations[0].prorated_value, 300.0));
}

#[test]
fn proration_validation_errors() {
    let mut store = seeded_store();

    let err = save_proration(&mut store, proration("x1", "ZZ", "2024-03-01", "2024-03-15")).unwrap_err();
    assert!(matches!(err, BillingError::ClientNotFound { .. }));

    let reversed_readings = ProRationInput {
        previous_reading: 10.0,
        current_reading: 5.0,
        ..proration("x1", "C1", "2024-03-01", "2024-03-15")
    };
    assert_eq!(
        save_proration(&mut store, reversed_readings).unwrap_err(),
        BillingError::readings_out_of_order()
    );

    let reversed_dates = proration("x1", "C1", "2024-03-15", "2024-03-01");
    assert_eq!(
        save_proration(&mut store, reversed_dates).unwrap_err(),
        BillingError::dates_out_of_order()
    );
    assert!(store.prorations.is_empty());
}

#[test]
fn deleting_an_unknown_proration_is_not_found() {
    let mut store = seeded_store();
    save_proration(&mut store, proration("x1", "C1", "2024-03-01", "2024-03-15")).unwrap();

    let err = delete_proration(&mut store, "nope").unwrap_err();
    assert!(matches!(err, BillingError::NotFound { entity: "Prorrateo", .. }));

    delete_proration(&mut store, "x1").unwrap();
    assert!(store.prorations.is_empty());
}

// groups

#[test]
fn group_totals_are_recomputed_from_entries() {
    let mut store = seeded_store();
    let entry = |kwh: f64, billed: f64| ConsumptionRecord {
        consumption_kwh: kwh,
        billed_value: billed,
        ..ConsumptionRecord::default()
    };
    let group = InvoiceGroup {
        id: "g1".into(),
        title: "Bloque A".into(),
        period_id: "p1".into(),
        entries: vec![entry(100.0, 11000.0), entry(30.0, 3300.0)],
        total_consumption: 1.0,
        total_billed: 1.0,
        ..InvoiceGroup::default()
    };
    save_group(&mut store, group).unwrap();

    let saved = &store.groups[0];
    assert!(close(saved.total_consumption, 130.0));
    assert!(close(saved.total_billed, 14300.0));
    assert_eq!(saved.period_name, "012024");

    delete_group(&mut store, "g1").unwrap();
    assert!(store.groups.is_empty());
}

// settings

#[test]
fn login_checks_stored_credentials() {
    let mut store = empty_store();
    let ok = LoginRequest {
        username: "admin".into(),
        password: "admin".into(),
    };
    let effects = verify_login(&store, &ok).unwrap();
    assert_eq!(effects.replies[0].event, "login-success");

    let change = CredentialsChange {
        new_user: None,
        new_pass: Some("s3creta".into()),
        current_pass: "admin".into(),
    };
    change_credentials(&mut store, change).unwrap();
    assert_eq!(store.credentials.username, "admin");
    assert!(matches!(verify_login(&store, &ok), Err(BillingError::Credentials(_))));
}

#[test]
fn credentials_change_requires_current_password() {
    let mut store = empty_store();
    let change = CredentialsChange {
        new_user: Some("otro".into()),
        new_pass: None,
        current_pass: "wrong".into(),
    };
    assert!(matches!(
        change_credentials(&mut store, change),
        Err(BillingError::Credentials(_))
    ));
    assert_eq!(store.credentials.username, "admin");
}

#[test]
fn saved_default_values_are_echoed_back() {
    let mut store = empty_store();
    let values = DefaultValues {
        cliente: "Desocupado".into(),
        ..DefaultValues::default()
    };
    let effects = save_default_values(&mut store, values.clone());
    assert_eq!(store.default_values, values);
    let events: Vec<&str> = effects.replies.iter().map(|m| m.event.as_str()).collect();
    assert_eq!(events, vec!["default-values-saved", "default-values-loaded"]);
    assert_eq!(effects.replies[1].data["cliente"], "Desocupado");
}

#[test]
fn padded_client_codes_resolve_to_the_trimmed_client() {
    let mut store = empty_store();
    save_client(&mut store, client("c1", " C1 ", "Uno", 1.0)).unwrap();
    save_period(&mut store, period("p1", "012024", 100.0, 0.1)).unwrap();
    assert_eq!(store.clients[0].code, "C1");

    save_consumption(
        &mut store,
        reading("r1", " C1", "p1", 0.0, 10.0),
        BillingPolicy::default(),
    )
    .unwrap();
    assert_eq!(store.consumption[0].code, "C1");
    assert!(close(store.client_by_code("C1").unwrap().average_consumption, 10.0));

    let err = save_consumption(
        &mut store,
        reading("r2", "C1 ", "p1", 10.0, 20.0),
        BillingPolicy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BillingError::DuplicateConsumption { .. }));

    save_proration(&mut store, proration("x1", "C1\t", "2024-03-01", "2024-03-10")).unwrap();
    assert_eq!(store.prorations[0].code, "C1");
}
