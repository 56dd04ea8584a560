// events.rs
// Wire protocol: `{"event": "<name>", "data": <payload>}` frames in both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    Client, ConsumptionInput, CredentialsChange, DefaultValues, InvoiceGroup, LoginRequest,
    Period, ProRationInput,
};

/// Incoming request decoded from a socket frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Request {
    #[serde(rename = "get-initial-data")]
    GetInitialData,
    #[serde(rename = "save-cliente")]
    SaveClient(Client),
    #[serde(rename = "delete-cliente")]
    DeleteClient(String),
    #[serde(rename = "save-periodo")]
    SavePeriod(Period),
    #[serde(rename = "delete-periodo")]
    DeletePeriod(String),
    #[serde(rename = "save-consumo")]
    SaveConsumption(ConsumptionInput),
    #[serde(rename = "delete-consumo")]
    DeleteConsumption(String),
    #[serde(rename = "save-prorrateo")]
    SaveProRation(ProRationInput),
    #[serde(rename = "delete-prorrateo")]
    DeleteProRation(String),
    #[serde(rename = "save-grupo")]
    SaveGroup(InvoiceGroup),
    #[serde(rename = "delete-grupo")]
    DeleteGroup(String),
    #[serde(rename = "get-default-values")]
    GetDefaultValues,
    #[serde(rename = "save-default-values")]
    SaveDefaultValues(DefaultValues),
    #[serde(rename = "apply-default-values")]
    ApplyDefaultValues(Value),
    #[serde(rename = "login")]
    Login(LoginRequest),
    #[serde(rename = "change-credentials")]
    ChangeCredentials(CredentialsChange),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetInitialData => "get-initial-data",
            Request::SaveClient(_) => "save-cliente",
            Request::DeleteClient(_) => "delete-cliente",
            Request::SavePeriod(_) => "save-periodo",
            Request::DeletePeriod(_) => "delete-periodo",
            Request::SaveConsumption(_) => "save-consumo",
            Request::DeleteConsumption(_) => "delete-consumo",
            Request::SaveProRation(_) => "save-prorrateo",
            Request::DeleteProRation(_) => "delete-prorrateo",
            Request::SaveGroup(_) => "save-grupo",
            Request::DeleteGroup(_) => "delete-grupo",
            Request::GetDefaultValues => "get-default-values",
            Request::SaveDefaultValues(_) => "save-default-values",
            Request::ApplyDefaultValues(_) => "apply-default-values",
            Request::Login(_) => "login",
            Request::ChangeCredentials(_) => "change-credentials",
        }
    }

    /// Signal sent back to the requester when the request is rejected.
    pub fn error_event(&self) -> &'static str {
        match self {
            Request::SaveClient(_) | Request::DeleteClient(_) => "error-cliente",
            Request::SavePeriod(_) | Request::DeletePeriod(_) => "error-periodo",
            Request::SaveConsumption(_) | Request::DeleteConsumption(_) => "error-consumo",
            Request::SaveProRation(_) | Request::DeleteProRation(_) => "error-prorrateo",
            Request::Login(_) => "login-error",
            Request::ChangeCredentials(_) => "credentials-error",
            _ => ERROR_EVENT,
        }
    }
}

/// Generic error signal for frames that cannot be routed anywhere else.
pub const ERROR_EVENT: &str = "error";

/// Outgoing frame: a collection broadcast, an acknowledgement or an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerMessage {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ServerMessage {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Payload-less acknowledgement such as `save-consumo-success`.
    pub fn signal(event: impl Into<String>) -> Self {
        Self::new(event, Value::Null)
    }

    pub fn error(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(event, Value::String(message.into()))
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"event":"{ERROR_EVENT}","data":"encoding failed"}}"#)
        })
    }
}

/// Frames produced by one request: broadcasts go to every socket, replies only
/// to the requester.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub broadcasts: Vec<ServerMessage>,
    pub replies: Vec<ServerMessage>,
}

impl Dispatch {
    pub fn reply(message: ServerMessage) -> Self {
        Self {
            broadcasts: Vec::new(),
            replies: vec![message],
        }
    }

    pub fn broadcast_events(&self) -> Vec<&str> {
        self.broadcasts.iter().map(|m| m.event.as_str()).collect()
    }

    pub fn reply_events(&self) -> Vec<&str> {
        self.replies.iter().map(|m| m.event.as_str()).collect()
    }
}
