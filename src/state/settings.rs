// Default values for vacant units and the single admin credential pair.

use serde_json::Value;
use tracing::info;

use crate::{
    error::{BillingError, BillingResult},
    events::ServerMessage,
    models::{CredentialsChange, DefaultValues, LoginRequest},
};

use super::{
    Effects,
    store::{Collection, EntityStore},
};

fn default_values_message(values: &DefaultValues) -> ServerMessage {
    ServerMessage::new(
        "default-values-loaded",
        serde_json::to_value(values).unwrap_or(Value::Null),
    )
}

pub fn get_default_values(store: &EntityStore) -> Effects {
    Effects::replies(vec![default_values_message(&store.default_values)])
}

pub fn save_default_values(store: &mut EntityStore, values: DefaultValues) -> Effects {
    store.default_values = values;
    store.persist(&[Collection::DefaultValues]);
    Effects::replies(vec![
        ServerMessage::signal("default-values-saved"),
        default_values_message(&store.default_values),
    ])
}

/// Echoed back unchanged; the browser applies the values itself.
pub fn apply_default_values(values: Value) -> Effects {
    Effects::replies(vec![ServerMessage::new("apply-default-values", values)])
}

pub fn verify_login(store: &EntityStore, login: &LoginRequest) -> BillingResult<Effects> {
    if login.username == store.credentials.username && login.password == store.credentials.password
    {
        Ok(Effects::replies(vec![ServerMessage::signal("login-success")]))
    } else {
        Err(BillingError::Credentials(
            "Usuario o contraseña incorrectos".into(),
        ))
    }
}

/// Requires the current password; blank fields are left unchanged.
pub fn change_credentials(
    store: &mut EntityStore,
    change: CredentialsChange,
) -> BillingResult<Effects> {
    if change.current_pass != store.credentials.password {
        return Err(BillingError::Credentials(
            "La contraseña actual es incorrecta".into(),
        ));
    }

    let new_user = change.new_user.filter(|u| !u.trim().is_empty());
    let new_pass = change.new_pass.filter(|p| !p.trim().is_empty());
    if new_user.is_none() && new_pass.is_none() {
        return Err(BillingError::Credentials("No se realizaron cambios".into()));
    }

    if let Some(user) = new_user {
        store.credentials.username = user;
    }
    if let Some(pass) = new_pass {
        store.credentials.password = pass;
    }
    store.persist(&[Collection::Credentials]);
    info!(username = %store.credentials.username, "credentials changed");

    Ok(Effects::replies(vec![ServerMessage::signal(
        "credentials-changed",
    )]))
}
