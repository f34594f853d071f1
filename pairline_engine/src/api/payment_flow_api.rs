use std::fmt::Debug;

use log::*;
use pls_common::{Coins, Rial};

use crate::{
    api::errors::PaymentFlowError,
    db_types::{AuthorityToken, NewPaymentRequest, PaymentRequest, PaymentStatus, UserId},
    events::{EventProducers, PaymentSettledEvent},
    traits::{PaymentGateway, PaymentLedgerDatabase},
};

/// What the buyer gets back from a purchase initiation: the stored `Pending` row and the gateway
/// URL to complete the payment at.
#[derive(Debug, Clone)]
pub struct PurchaseTicket {
    pub request: PaymentRequest,
    pub redirect_url: String,
}

/// The result of one reconciliation callback.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// No row exists for the authority token. Nothing was changed.
    Unknown,
    /// This call performed the `Pending` → terminal transition. If the new status is `Success`,
    /// the coins have been credited (exactly once).
    Settled { request: PaymentRequest },
    /// The row was already terminal; the stored outcome is returned and nothing was credited.
    AlreadySettled { status: PaymentStatus },
}

/// `PaymentFlowApi` drives the purchase lifecycle: it opens payment requests against the gateway
/// and reconciles the asynchronous gateway callbacks into the ledger, crediting coins exactly
/// once per successful payment.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B: Clone, G: Clone> Clone for PaymentFlowApi<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: self.gateway.clone(), producers: self.producers.clone() }
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: PaymentLedgerDatabase,
    G: PaymentGateway,
{
    /// Opens a purchase of `coins` for `amount` with the gateway and records the `Pending` row.
    ///
    /// A gateway failure surfaces before anything is written, so no orphan rows are left behind.
    /// The UNIQUE constraint on the authority token rejects a duplicate row for the same gateway
    /// transaction.
    pub async fn create_purchase(
        &self,
        user_id: UserId,
        amount: Rial,
        coins: Coins,
        description: &str,
    ) -> Result<PurchaseTicket, PaymentFlowError> {
        let intent = self.gateway.request_payment(amount, description).await?;
        let authority = intent.authority.clone();
        let request = NewPaymentRequest::new(user_id, amount, coins, intent.authority);
        let row = self.db.insert_payment_request(request).await?;
        debug!("💳️ Opened purchase [{authority}]: {coins} for {amount} by {user_id}");
        Ok(PurchaseTicket { request: row, redirect_url: intent.redirect_url })
    }

    /// Applies one gateway callback to the ledger. Idempotent: however many times the gateway
    /// retries a callback, coins are credited at most once and every call reports the same
    /// terminal outcome.
    ///
    /// `reported_ok` is what the callback *claims*; a claimed success is never trusted without an
    /// independent `verify_payment` round-trip using the stored amount. A gateway failure during
    /// that round-trip leaves the row `Pending` so a later callback (or a manual poke) can retry.
    pub async fn reconcile(
        &self,
        authority: &AuthorityToken,
        reported_ok: bool,
    ) -> Result<ReconcileOutcome, PaymentFlowError> {
        let row = match self.db.fetch_payment_request(authority).await? {
            None => {
                info!("💳️ Reconciliation callback for unknown authority [{authority}]");
                return Ok(ReconcileOutcome::Unknown);
            },
            Some(row) => row,
        };
        if row.status.is_terminal() {
            // duplicate or retried callback. Not an error, and no second gateway round-trip.
            info!("💳️ Duplicate reconciliation for [{authority}]; stored outcome is {}", row.status);
            return Ok(ReconcileOutcome::AlreadySettled { status: row.status });
        }

        let outcome = if reported_ok {
            match self.gateway.verify_payment(authority, row.amount).await {
                Ok(true) => PaymentStatus::Success,
                Ok(false) => {
                    info!("💳️ Gateway rejected verification for [{authority}]");
                    PaymentStatus::Failed
                },
                Err(e) => {
                    // leave the row Pending; a later callback can still settle it
                    warn!("💳️ Could not verify [{authority}] with the gateway: {e}. Row stays Pending.");
                    return Err(e.into());
                },
            }
        } else {
            PaymentStatus::Failed
        };

        let result = self.db.settle_payment_request(authority, outcome).await?;
        if result.transitioned {
            info!("💳️ Settled [{authority}] as {}; {} for {}", outcome, result.request.coins, result.request.user_id);
            self.call_payment_settled_hook(&result.request).await;
            Ok(ReconcileOutcome::Settled { request: result.request })
        } else {
            // a concurrent callback won the settle race
            info!("💳️ Lost the settle race for [{authority}]; stored outcome is {}", result.request.status);
            Ok(ReconcileOutcome::AlreadySettled { status: result.request.status })
        }
    }

    async fn call_payment_settled_hook(&self, request: &PaymentRequest) {
        for emitter in &self.producers.payment_settled_producer {
            let event = PaymentSettledEvent { request: request.clone() };
            emitter.publish_event(event).await;
        }
    }
}
