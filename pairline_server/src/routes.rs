//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into
//! a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the store, gateway and sink traits; [`configure`] pins them to
//! concrete types when the app is assembled (the production types in [`crate::server`], mocks in
//! the endpoint tests).
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use pairline_engine::{
    db_types::{AuthorityToken, PaymentStatus},
    MessageSink,
    PairingApi,
    PaymentFlowApi,
    PaymentFlowError,
    PaymentGateway,
    PaymentLedgerDatabase,
    ReconcileOutcome,
    UserApi,
    UserManagement,
};

use crate::{
    data_objects::{CallbackParams, InboundUpdate, JsonResponse},
    errors::ServerError,
    update_handler::{dispatch_update, AppSettings},
};

/// Registers every route against handlers instantiated for the given backend, gateway and sink
/// types.
pub fn configure<B, G, S>(cfg: &mut web::ServiceConfig)
where
    B: UserManagement + PaymentLedgerDatabase + 'static,
    G: PaymentGateway + 'static,
    S: MessageSink + 'static,
{
    cfg.service(health)
        .route("/payment/callback", web::get().to(payment_callback::<B, G>))
        .route("/bot/update", web::post().to(bot_update::<B, G, S>));
}

// ----------------------------------------------   Health  ----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ------------------------------------------  Payment callback  -----------------------------------------------------
/// The gateway's return URL: `GET /payment/callback?Authority=<token>&Status=<OK|NOK>`.
///
/// Idempotent by construction — reconciliation settles each authority token at most once, and
/// every later call reports the stored outcome. The response payload is a fixed JSON status
/// either way. A gateway outage during verification is answered with 503 so the caller retries
/// while the row stays pending.
pub async fn payment_callback<B, G>(
    query: web::Query<CallbackParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedgerDatabase + 'static,
    G: PaymentGateway + 'static,
{
    trace!("💻️ Received payment callback for authority [{}]", query.authority);
    let authority = AuthorityToken::from(query.authority.clone());
    match api.reconcile(&authority, query.reported_ok()).await {
        Ok(ReconcileOutcome::Settled { request }) => Ok(status_payload(request.status)),
        Ok(ReconcileOutcome::AlreadySettled { status }) => Ok(status_payload(status)),
        Ok(ReconcileOutcome::Unknown) => Ok(HttpResponse::Ok().json(JsonResponse::new("unknown transaction"))),
        Err(e @ PaymentFlowError::Gateway(_)) => {
            warn!("💻️ Reconciliation for [{authority}] hit a gateway problem: {e}");
            Err(e.into())
        },
        Err(e) => Err(e.into()),
    }
}

fn status_payload(status: PaymentStatus) -> HttpResponse {
    let response = match status {
        PaymentStatus::Success => JsonResponse::new("payment completed"),
        PaymentStatus::Failed => JsonResponse::new("payment failed"),
        PaymentStatus::Pending => JsonResponse::new("payment pending"),
    };
    HttpResponse::Ok().json(response)
}

// --------------------------------------------  Bot updates  --------------------------------------------------------
/// Inbound transport events. The transport expects a quick 200 for anything it could parse; all
/// user-facing feedback goes out through the sink, not the HTTP response.
pub async fn bot_update<B, G, S>(
    body: web::Json<InboundUpdate>,
    users: web::Data<UserApi<B>>,
    pairing: web::Data<PairingApi<B, S>>,
    payments: web::Data<PaymentFlowApi<B, G>>,
    sink: web::Data<S>,
    settings: web::Data<AppSettings>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement + PaymentLedgerDatabase + 'static,
    G: PaymentGateway + 'static,
    S: MessageSink + 'static,
{
    dispatch_update(body.into_inner(), &users, &pairing, &payments, sink.get_ref(), &settings).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::new("ok")))
}
