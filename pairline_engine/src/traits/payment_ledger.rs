use thiserror::Error;

use crate::db_types::{AuthorityToken, NewPaymentRequest, PaymentRequest, PaymentStatus};

/// The result of a settle call: the row as stored, and whether *this* call performed the
/// `Pending` → terminal transition. When `transitioned` is false the row was already terminal and
/// nothing was credited.
#[derive(Debug, Clone)]
pub struct SettleResult {
    pub request: PaymentRequest,
    pub transitioned: bool,
}

/// Store operations for the payment audit ledger.
///
/// Rows are keyed by the gateway's authority token. The UNIQUE constraint on that column is the
/// sole defense against recording one gateway transaction twice.
#[allow(async_fn_in_trait)]
pub trait PaymentLedgerDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Inserts a new `Pending` row. Fails with [`PaymentLedgerError::DuplicateAuthority`] if a row
    /// with the same authority token already exists.
    async fn insert_payment_request(&self, request: NewPaymentRequest) -> Result<PaymentRequest, PaymentLedgerError>;

    /// Fetches the row for the given authority token, if any.
    async fn fetch_payment_request(
        &self,
        authority: &AuthorityToken,
    ) -> Result<Option<PaymentRequest>, PaymentLedgerError>;

    /// Moves the row from `Pending` to the given terminal state, crediting the purchased coins to
    /// the buyer when the outcome is `Success`. The status check, the transition and the credit
    /// run in one store transaction, so two concurrent callers cannot both observe `Pending` and
    /// both credit.
    ///
    /// If the row is already terminal, the stored row is returned with `transitioned == false`
    /// and no credit is applied.
    async fn settle_payment_request(
        &self,
        authority: &AuthorityToken,
        outcome: PaymentStatus,
    ) -> Result<SettleResult, PaymentLedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentLedgerError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot insert payment request, one already exists for authority {0}")]
    DuplicateAuthority(AuthorityToken),
    #[error("No payment request exists for authority {0}")]
    UnknownAuthority(AuthorityToken),
    #[error("{0} is not a terminal payment status")]
    NotATerminalStatus(PaymentStatus),
    #[error("{0}")]
    AccountError(#[from] crate::traits::UserAccountError),
}

impl From<sqlx::Error> for PaymentLedgerError {
    fn from(e: sqlx::Error) -> Self {
        PaymentLedgerError::DatabaseError(e.to_string())
    }
}
