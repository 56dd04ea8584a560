use tracing::info;

use crate::{
    error::{BillingError, BillingResult},
    models::Client,
};

use super::{
    Effects,
    recalc::recalculate,
    store::{Collection, EntityStore, delete_where, upsert},
};

/// Collections whose contents change when a client changes.
const CLIENT_BROADCAST: [Collection; 3] = [
    Collection::Clients,
    Collection::Consumption,
    Collection::ProRations,
];

pub fn save_client(store: &mut EntityStore, mut client: Client) -> BillingResult<Effects> {
    client.id = store.id_or_new(Collection::Clients, Some(client.id.as_str()));
    client.code = client.code.trim().to_string();

    if store
        .clients
        .iter()
        .any(|c| c.code == client.code && c.id != client.id)
    {
        return Err(BillingError::DuplicateCode { code: client.code });
    }

    client.average_consumption = store
        .client_by_id(&client.id)
        .map(|existing| existing.average_consumption)
        .unwrap_or(0.0);

    upsert(&mut store.clients, client);
    recalculate(store);
    store.persist(&CLIENT_BROADCAST);

    Ok(Effects::broadcast(&CLIENT_BROADCAST))
}

/// Removes a client together with its consumption records and pro-rations.
pub fn delete_client(store: &mut EntityStore, id: &str) -> BillingResult<Effects> {
    let code = store
        .client_by_id(id)
        .map(|c| c.code.clone())
        .ok_or_else(|| BillingError::NotFound {
            entity: "Cliente",
            id: id.to_string(),
        })?;

    let records = delete_where(&mut store.consumption, |c| c.code == code);
    let prorations = delete_where(&mut store.prorations, |p| p.code == code);
    delete_where(&mut store.clients, |c| c.id == id);
    info!(%code, records, prorations, "client deleted with dependents");

    recalculate(store);

    let affected = [
        Collection::Clients,
        Collection::Consumption,
        Collection::ProRations,
        Collection::Periods,
    ];
    store.persist(&affected);
    Ok(Effects::broadcast(&affected))
}
