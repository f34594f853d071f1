use pls_common::Rial;
use thiserror::Error;

use crate::db_types::AuthorityToken;

/// What the gateway hands back when a payment is initiated: the token that identifies the attempt
/// from here on, and the URL the buyer must be redirected to.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub authority: AuthorityToken,
    pub redirect_url: String,
}

/// The external payment processor.
///
/// Implementations must apply their own network timeout and bounded retry policy; a hung gateway
/// call must never block a handler indefinitely. [`GatewayError`] is only surfaced once retries
/// are exhausted.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Asks the gateway to open a payment of `amount`, returning the authority token and the
    /// redirect URL for the buyer.
    async fn request_payment(&self, amount: Rial, description: &str) -> Result<PaymentIntent, GatewayError>;

    /// Independently confirms the outcome of the payment identified by `authority`. The claimed
    /// amount must match what the gateway recorded. Returns whether the payment is verified.
    async fn verify_payment(&self, authority: &AuthorityToken, amount: Rial) -> Result<bool, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("Could not reach the payment gateway: {0}")]
    Http(String),
    #[error("The payment gateway rejected the request (code {0})")]
    Rejected(i64),
    #[error("The payment gateway sent a response we could not interpret: {0}")]
    MalformedResponse(String),
}
