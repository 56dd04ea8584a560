// models.rs
// Domain models persisted as JSON blobs and exchanged over the event socket.
// Field names on the wire keep the historical Spanish vocabulary so existing
// data files keep loading.

use serde::{Deserialize, Deserializer, Serialize};

/// Occupancy status of a client's unit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ClientStatus {
    #[default]
    Occupied,
    Vacant,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Occupied => "Ocupado",
            ClientStatus::Vacant => "Desocupado",
        }
    }
}

impl From<String> for ClientStatus {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("desocupado") {
            ClientStatus::Vacant
        } else {
            ClientStatus::Occupied
        }
    }
}

impl From<ClientStatus> for String {
    fn from(value: ClientStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Tenant of the property, identified by `id` and by its business `code`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Client {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "bodega", default)]
    pub warehouse: String,
    #[serde(rename = "local", default)]
    pub unit: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "administrador", default)]
    pub manager: String,
    #[serde(rename = "direccion", default)]
    pub address: String,
    #[serde(rename = "nit", default)]
    pub tax_id: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(
        rename = "factorMedida",
        default = "default_meter_factor",
        deserialize_with = "de::meter_factor"
    )]
    pub meter_factor: f64,
    #[serde(rename = "estado", default)]
    pub status: ClientStatus,
    #[serde(rename = "consumoPromedio", default, deserialize_with = "de::lenient_f64")]
    pub average_consumption: f64,
}

/// Billing month with its own tariff. `name` is an MMYYYY token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Period {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "porcentajeContribucion", default, deserialize_with = "de::lenient_f64")]
    pub contribution_rate: f64,
    #[serde(rename = "costoUnitario", default, deserialize_with = "de::lenient_f64")]
    pub unit_cost: f64,
    #[serde(rename = "fechaInicio", default)]
    pub start_date: String,
    #[serde(rename = "fechaFin", default)]
    pub end_date: String,
    #[serde(rename = "diasFacturados", default, deserialize_with = "de::lenient_i64")]
    pub billed_days: i64,
    #[serde(rename = "consumoTotal", default, deserialize_with = "de::lenient_f64")]
    pub total_consumption: f64,
}

impl Period {
    /// Chronological key parsed from the MMYYYY name as `(year, month)`.
    pub fn chronological_key(&self) -> Option<(u32, u32)> {
        let name = self.name.trim();
        if name.len() != 6 || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let month: u32 = name[..2].parse().ok()?;
        let year: u32 = name[2..].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some((year, month))
    }
}

/// Metered consumption of one client in one period.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "periodoId", default)]
    pub period_id: String,
    #[serde(rename = "periodoNombre", default)]
    pub period_name: String,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "bodega", default)]
    pub warehouse: String,
    #[serde(rename = "local", default)]
    pub unit: String,
    #[serde(rename = "clienteNombre", default)]
    pub client_name: String,
    #[serde(rename = "estado", default)]
    pub status: ClientStatus,
    #[serde(rename = "lecturaAnterior", default, deserialize_with = "de::lenient_f64")]
    pub previous_reading: f64,
    #[serde(rename = "lecturaActual", default, deserialize_with = "de::lenient_f64")]
    pub current_reading: f64,
    #[serde(rename = "impuestoSeguridad", default, deserialize_with = "de::lenient_f64")]
    pub tax_amount: f64,
    #[serde(rename = "otrosConceptos", default, deserialize_with = "de::lenient_f64")]
    pub other_charges: f64,
    #[serde(rename = "consumoKwh", default, deserialize_with = "de::lenient_f64")]
    pub consumption_kwh: f64,
    #[serde(rename = "valorFacturado", default, deserialize_with = "de::lenient_f64")]
    pub billed_value: f64,
}

/// Incoming save-consumo payload. Derived and denormalized fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "periodoId", default)]
    pub period_id: String,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "lecturaAnterior", default, deserialize_with = "de::lenient_f64")]
    pub previous_reading: f64,
    #[serde(rename = "lecturaActual", default, deserialize_with = "de::lenient_f64")]
    pub current_reading: f64,
    #[serde(rename = "impuestoSeguridad", default, deserialize_with = "de::lenient_f64")]
    pub tax_amount: f64,
    #[serde(rename = "otrosConceptos", default, deserialize_with = "de::lenient_f64")]
    pub other_charges: f64,
    #[serde(rename = "ajustarMultiplo10", default)]
    pub round_to_tens: Option<bool>,
}

/// Charge for a date range that does not line up with a billing period.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProRatedCharge {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "bodega", default)]
    pub warehouse: String,
    #[serde(rename = "local", default)]
    pub unit: String,
    #[serde(rename = "clienteNombre", default)]
    pub client_name: String,
    #[serde(rename = "estado", default)]
    pub status: ClientStatus,
    #[serde(rename = "fechaInicio", default)]
    pub start_date: String,
    #[serde(rename = "fechaEntrega", default)]
    pub end_date: String,
    #[serde(rename = "lecturaAnterior", default, deserialize_with = "de::lenient_f64")]
    pub previous_reading: f64,
    #[serde(rename = "lecturaActual", default, deserialize_with = "de::lenient_f64")]
    pub current_reading: f64,
    #[serde(rename = "porcentajeContribucion", default, deserialize_with = "de::lenient_f64")]
    pub contribution_rate: f64,
    #[serde(rename = "costoUnitario", default, deserialize_with = "de::lenient_f64")]
    pub unit_cost: f64,
    #[serde(rename = "impuestoSeguridad", default, deserialize_with = "de::lenient_f64")]
    pub tax_amount: f64,
    #[serde(rename = "otrosConceptos", default, deserialize_with = "de::lenient_f64")]
    pub other_charges: f64,
    #[serde(rename = "diasFacturados", default, deserialize_with = "de::lenient_i64")]
    pub billed_days: i64,
    #[serde(rename = "consumoKwh", default, deserialize_with = "de::lenient_f64")]
    pub consumption_kwh: f64,
    #[serde(rename = "impuestoParcial", default, deserialize_with = "de::lenient_f64")]
    pub partial_tax: f64,
    #[serde(rename = "valorProrrateado", default, deserialize_with = "de::lenient_f64")]
    pub prorated_value: f64,
    #[serde(rename = "direccion", default)]
    pub address: String,
    #[serde(rename = "nit", default)]
    pub tax_id: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(
        rename = "factorMedida",
        default = "default_meter_factor",
        deserialize_with = "de::meter_factor"
    )]
    pub meter_factor: f64,
    #[serde(
        rename = "cuManual",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::optional_f64"
    )]
    pub manual_unit_cost: Option<f64>,
    /// Percentage, e.g. 8 for 8%.
    #[serde(
        rename = "contribucionManual",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::optional_f64"
    )]
    pub manual_contribution_pct: Option<f64>,
}

/// Incoming save-prorrateo payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProRationInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "fechaInicio", default)]
    pub start_date: String,
    #[serde(rename = "fechaEntrega", default)]
    pub end_date: String,
    #[serde(rename = "lecturaAnterior", default, deserialize_with = "de::lenient_f64")]
    pub previous_reading: f64,
    #[serde(rename = "lecturaActual", default, deserialize_with = "de::lenient_f64")]
    pub current_reading: f64,
    #[serde(rename = "impuestoSeguridad", default, deserialize_with = "de::lenient_f64")]
    pub tax_amount: f64,
    #[serde(rename = "otrosConceptos", default, deserialize_with = "de::lenient_f64")]
    pub other_charges: f64,
    #[serde(rename = "cuManual", default, deserialize_with = "de::optional_f64")]
    pub manual_unit_cost: Option<f64>,
    #[serde(rename = "contribucionManual", default, deserialize_with = "de::optional_f64")]
    pub manual_contribution_pct: Option<f64>,
}

/// Ad-hoc invoice listing. `entries` is a frozen copy taken at save time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvoiceGroup {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "periodoId", default)]
    pub period_id: String,
    #[serde(rename = "periodoNombre", default)]
    pub period_name: String,
    #[serde(rename = "clientes", default)]
    pub entries: Vec<ConsumptionRecord>,
    #[serde(rename = "totalConsumo", default, deserialize_with = "de::lenient_f64")]
    pub total_consumption: f64,
    #[serde(rename = "totalFacturado", default, deserialize_with = "de::lenient_f64")]
    pub total_billed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".into(),
            password: "admin".into(),
        }
    }
}

/// Placeholder values the UI fills in when a unit becomes vacant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultValues {
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub administrador: String,
    #[serde(default)]
    pub nit: String,
    #[serde(default)]
    pub telefono: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsChange {
    #[serde(default)]
    pub new_user: Option<String>,
    #[serde(default)]
    pub new_pass: Option<String>,
    #[serde(default)]
    pub current_pass: String,
}

fn default_meter_factor() -> f64 {
    1.0
}

/// Lenient numeric decoding: the browser sends numbers, numeric strings,
/// blanks or nulls interchangeably.
pub(crate) mod de {
    use super::*;
    use serde_json::Value;

    fn as_number(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(as_number(&value).unwrap_or(0.0))
    }

    pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(as_number(&value).map(|n| n.round() as i64).unwrap_or(0))
    }

    pub fn optional_f64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(as_number(&value))
    }

    /// Zero or missing factors fall back to 1.
    pub fn meter_factor<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(as_number(&value)
            .filter(|n| *n != 0.0)
            .unwrap_or_else(default_meter_factor))
    }
}
