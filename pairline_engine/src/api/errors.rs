use thiserror::Error;

use crate::{
    db_types::UserId,
    matching::SessionError,
    traits::{GatewayError, PaymentLedgerError, UserAccountError},
};

#[derive(Debug, Clone, Error)]
pub enum PairingError {
    #[error("{0} is already in an active session")]
    AlreadyInSession(UserId),
    #[error("{0}")]
    AccountError(#[from] UserAccountError),
    #[error("Session bookkeeping failed: {0}")]
    SessionError(String),
}

impl From<SessionError> for PairingError {
    fn from(e: SessionError) -> Self {
        PairingError::SessionError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Ledger(#[from] PaymentLedgerError),
}
