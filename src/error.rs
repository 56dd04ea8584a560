// error.rs
// Domain errors raised by the mutation handlers. The Display text is what the
// requester receives on the error signal.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("{0}")]
    Validation(String),

    #[error("El código ya existe")]
    DuplicateCode { code: String },

    #[error("Ya se ha ingresado un consumo para este código en este periodo")]
    DuplicateConsumption { code: String, period_id: String },

    #[error("El código de cliente no existe")]
    ClientNotFound { code: String },

    #[error("El periodo no existe")]
    PeriodNotFound { period_id: String },

    #[error("{entity} no encontrado")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Credentials(String),
}

impl BillingError {
    pub fn readings_out_of_order() -> Self {
        BillingError::Validation(
            "La lectura anterior debe ser menor o igual a la lectura actual".into(),
        )
    }

    pub fn dates_out_of_order() -> Self {
        BillingError::Validation(
            "La fecha inicial no puede ser posterior a la fecha final".into(),
        )
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "validation",
            BillingError::DuplicateCode { .. } => "duplicate_code",
            BillingError::DuplicateConsumption { .. } => "duplicate_consumption",
            BillingError::ClientNotFound { .. } => "client_not_found",
            BillingError::PeriodNotFound { .. } => "period_not_found",
            BillingError::NotFound { .. } => "not_found",
            BillingError::Credentials(_) => "credentials",
        }
    }
}

pub type BillingResult<T> = std::result::Result<T, BillingError>;
