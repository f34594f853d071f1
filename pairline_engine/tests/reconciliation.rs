//! The payment reconciliation state machine, driven against a real SQLite ledger with a
//! scriptable gateway.
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use pairline_engine::{
    db_types::{AuthorityToken, Gender, NewPaymentRequest, NewUser, PaymentStatus, UserId},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_db, random_db_path},
    GatewayError,
    PaymentFlowApi,
    PaymentFlowError,
    PaymentGateway,
    PaymentLedgerDatabase,
    PaymentLedgerError,
    ReconcileOutcome,
    SqliteDatabase,
    UserApi,
    UserManagement,
};
use pairline_engine::traits::PaymentIntent;
use pls_common::{Coins, Rial};

/// A gateway whose verify answer is scripted per test. Counts calls so tests can assert that
/// terminal rows never trigger another round-trip.
#[derive(Clone)]
struct ScriptedGateway {
    verify_answer: Arc<Mutex<Result<bool, GatewayError>>>,
    verify_calls: Arc<AtomicUsize>,
    next_authority: Arc<AtomicU64>,
}

impl ScriptedGateway {
    fn verifying(answer: Result<bool, GatewayError>) -> Self {
        Self {
            verify_answer: Arc::new(Mutex::new(answer)),
            verify_calls: Arc::new(AtomicUsize::new(0)),
            next_authority: Arc::new(AtomicU64::new(1)),
        }
    }

    fn set_verify_answer(&self, answer: Result<bool, GatewayError>) {
        *self.verify_answer.lock().unwrap() = answer;
    }

    fn verify_call_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for ScriptedGateway {
    async fn request_payment(&self, _amount: Rial, _description: &str) -> Result<PaymentIntent, GatewayError> {
        let n = self.next_authority.fetch_add(1, Ordering::SeqCst);
        let authority = AuthorityToken(format!("A-test-{n:06}"));
        let redirect_url = format!("https://gateway.test/StartPay/{authority}");
        Ok(PaymentIntent { authority, redirect_url })
    }

    async fn verify_payment(&self, _authority: &AuthorityToken, _amount: Rial) -> Result<bool, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.verify_answer.lock().unwrap().clone()
    }
}

async fn setup(
    verify_answer: Result<bool, GatewayError>,
) -> (SqliteDatabase, PaymentFlowApi<SqliteDatabase, ScriptedGateway>, ScriptedGateway, UserId) {
    let db = prepare_test_db(&random_db_path()).await;
    let gateway = ScriptedGateway::verifying(verify_answer);
    let api = PaymentFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
    let users = UserApi::new(db.clone());
    let buyer = NewUser {
        telegram_id: UserId(42),
        name: "buyer".to_string(),
        gender: Gender::Male,
        province: "Fars".to_string(),
        city: "Shiraz".to_string(),
        age: 30,
        profile_pic: None,
    };
    let (profile, _) = users.register(buyer, Coins::from(0)).await.unwrap();
    (db, api, gateway, profile.telegram_id)
}

#[tokio::test]
async fn create_purchase_records_a_pending_row() {
    let (db, api, _, buyer) = setup(Ok(true)).await;

    let ticket = api.create_purchase(buyer, Rial::from(25_000), Coins::from(50), "50 coins").await.unwrap();
    assert_eq!(ticket.request.status, PaymentStatus::Pending);
    assert!(ticket.redirect_url.contains(ticket.request.authority.as_str()));

    let stored = db.fetch_payment_request(&ticket.request.authority).await.unwrap().unwrap();
    assert_eq!(stored.user_id, buyer);
    assert_eq!(stored.amount, Rial::from(25_000));
    assert_eq!(stored.coins, Coins::from(50));
}

#[tokio::test]
async fn reconcile_credits_exactly_once_however_often_the_callback_repeats() {
    let (db, api, gateway, buyer) = setup(Ok(true)).await;
    let ticket = api.create_purchase(buyer, Rial::from(25_000), Coins::from(50), "50 coins").await.unwrap();
    let authority = ticket.request.authority;

    let first = api.reconcile(&authority, true).await.unwrap();
    let ReconcileOutcome::Settled { request } = first else {
        panic!("first callback should settle the row");
    };
    assert_eq!(request.status, PaymentStatus::Success);
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(50));

    let second = api.reconcile(&authority, true).await.unwrap();
    let ReconcileOutcome::AlreadySettled { status } = second else {
        panic!("second callback should report the stored outcome");
    };
    assert_eq!(status, PaymentStatus::Success);
    // 50, not 100 — and the gateway was only consulted once
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(50));
    assert_eq!(gateway.verify_call_count(), 1);
}

#[tokio::test]
async fn an_unknown_authority_changes_nothing() {
    let (db, api, gateway, buyer) = setup(Ok(true)).await;

    let outcome = api.reconcile(&AuthorityToken("tok-unknown".to_string()), true).await.unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Unknown));
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(0));
    assert_eq!(gateway.verify_call_count(), 0);
}

#[tokio::test]
async fn a_reported_failure_settles_as_failed_without_a_gateway_round_trip() {
    let (db, api, gateway, buyer) = setup(Ok(true)).await;
    let ticket = api.create_purchase(buyer, Rial::from(25_000), Coins::from(50), "50 coins").await.unwrap();

    let outcome = api.reconcile(&ticket.request.authority, false).await.unwrap();
    let ReconcileOutcome::Settled { request } = outcome else {
        panic!("the NOK callback should settle the row");
    };
    assert_eq!(request.status, PaymentStatus::Failed);
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(0));
    assert_eq!(gateway.verify_call_count(), 0);
}

#[tokio::test]
async fn a_rejected_verification_settles_as_failed() {
    let (db, api, _, buyer) = setup(Ok(false)).await;
    let ticket = api.create_purchase(buyer, Rial::from(25_000), Coins::from(50), "50 coins").await.unwrap();

    let outcome = api.reconcile(&ticket.request.authority, true).await.unwrap();
    let ReconcileOutcome::Settled { request } = outcome else {
        panic!("expected a settled row");
    };
    assert_eq!(request.status, PaymentStatus::Failed);
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(0));
}

#[tokio::test]
async fn a_gateway_outage_leaves_the_row_pending_and_retryable() {
    let (db, api, gateway, buyer) = setup(Err(GatewayError::Timeout)).await;
    let ticket = api.create_purchase(buyer, Rial::from(50_000), Coins::from(120), "120 coins").await.unwrap();
    let authority = ticket.request.authority;

    let result = api.reconcile(&authority, true).await;
    assert!(matches!(result, Err(PaymentFlowError::Gateway(GatewayError::Timeout))));
    let row = db.fetch_payment_request(&authority).await.unwrap().unwrap();
    assert_eq!(row.status, PaymentStatus::Pending);
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(0));

    // the gateway comes back, a retried callback settles the row
    gateway.set_verify_answer(Ok(true));
    let outcome = api.reconcile(&authority, true).await.unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Settled { .. }));
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(120));
}

#[tokio::test]
async fn one_gateway_transaction_cannot_be_recorded_twice() {
    let (db, _, _, buyer) = setup(Ok(true)).await;
    let request = NewPaymentRequest::new(buyer, Rial::from(25_000), Coins::from(50), AuthorityToken("A-dup".into()));
    db.insert_payment_request(request.clone()).await.unwrap();

    let result = db.insert_payment_request(request).await;
    assert!(matches!(result, Err(PaymentLedgerError::DuplicateAuthority(a)) if a.as_str() == "A-dup"));
}

#[tokio::test]
async fn concurrent_callbacks_settle_once_and_credit_once() {
    let (db, api, _, buyer) = setup(Ok(true)).await;
    let ticket = api.create_purchase(buyer, Rial::from(25_000), Coins::from(50), "50 coins").await.unwrap();
    let authority = ticket.request.authority;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let api = api.clone();
        let authority = authority.clone();
        handles.push(tokio::spawn(async move { api.reconcile(&authority, true).await.unwrap() }));
    }
    let mut settled = 0;
    for h in handles {
        match h.await.unwrap() {
            ReconcileOutcome::Settled { request } => {
                assert_eq!(request.status, PaymentStatus::Success);
                settled += 1;
            },
            ReconcileOutcome::AlreadySettled { status } => assert_eq!(status, PaymentStatus::Success),
            ReconcileOutcome::Unknown => panic!("the row exists"),
        }
    }
    assert_eq!(settled, 1);
    assert_eq!(db.coin_balance(buyer).await.unwrap(), Coins::from(50));
}
