use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use pairline_engine::{GatewayError, PairingError, PaymentFlowError, PaymentLedgerError, UserAccountError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The payment gateway is unavailable. Try again later.")]
    GatewayUnavailable,
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PairingError> for ServerError {
    fn from(e: PairingError) -> Self {
        match e {
            PairingError::AccountError(e) => e.into(),
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<UserAccountError> for ServerError {
    fn from(e: UserAccountError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::Gateway(GatewayError::Timeout | GatewayError::Http(_)) => Self::GatewayUnavailable,
            PaymentFlowError::Gateway(e) => Self::BackendError(e.to_string()),
            PaymentFlowError::Ledger(PaymentLedgerError::AccountError(e)) => e.into(),
            PaymentFlowError::Ledger(e) => Self::BackendError(e.to_string()),
        }
    }
}
