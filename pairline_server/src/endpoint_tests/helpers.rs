//! Shared scaffolding for the endpoint tests: a real temp-file SQLite store, a scriptable
//! gateway, and a sink that records every outbound message.
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use actix_web::web;
use pairline_engine::{
    db_types::{AuthorityToken, Gender, MessagePayload, NewUser, UserId},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_db, random_db_path},
    traits::PaymentIntent,
    DeliveryError,
    GatewayError,
    MessageSink,
    PairingApi,
    PaymentFlowApi,
    PaymentGateway,
    SqliteDatabase,
    UserApi,
};
use pls_common::Coins;

use crate::update_handler::AppSettings;

pub const TEST_FEE: i64 = 2;
pub const TEST_SIGNUP_BONUS: i64 = 15;

#[derive(Clone)]
pub struct ScriptedGateway {
    pub verify_answer: Arc<Mutex<Result<bool, GatewayError>>>,
    pub verify_calls: Arc<AtomicUsize>,
    next_authority: Arc<AtomicU64>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            verify_answer: Arc::new(Mutex::new(Ok(true))),
            verify_calls: Arc::new(AtomicUsize::new(0)),
            next_authority: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl PaymentGateway for ScriptedGateway {
    async fn request_payment(&self, _amount: pls_common::Rial, _description: &str) -> Result<PaymentIntent, GatewayError> {
        let n = self.next_authority.fetch_add(1, Ordering::SeqCst);
        let authority = AuthorityToken(format!("A-endpoint-{n:06}"));
        let redirect_url = format!("https://gateway.test/StartPay/{authority}");
        Ok(PaymentIntent { authority, redirect_url })
    }

    async fn verify_payment(&self, _authority: &AuthorityToken, _amount: pls_common::Rial) -> Result<bool, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.verify_answer.lock().unwrap().clone()
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<(UserId, MessagePayload)>>>,
}

impl RecordingSink {
    pub fn texts_to(&self, user: UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(to, p)| match (to, p) {
                (to, MessagePayload::Text(t)) if *to == user => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, user: UserId) -> Option<String> {
        self.texts_to(user).pop()
    }
}

impl MessageSink for RecordingSink {
    async fn send(&self, target: UserId, payload: &MessagePayload) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((target, payload.clone()));
        Ok(())
    }
}

pub struct TestContext {
    pub db: SqliteDatabase,
    pub gateway: ScriptedGateway,
    pub sink: RecordingSink,
    pub users_data: web::Data<UserApi<SqliteDatabase>>,
    pub pairing_data: web::Data<PairingApi<SqliteDatabase, RecordingSink>>,
    pub payments_data: web::Data<PaymentFlowApi<SqliteDatabase, ScriptedGateway>>,
    pub sink_data: web::Data<RecordingSink>,
    pub settings_data: web::Data<AppSettings>,
}

pub async fn setup() -> TestContext {
    let db = prepare_test_db(&random_db_path()).await;
    let gateway = ScriptedGateway::default();
    let sink = RecordingSink::default();
    let pairing = PairingApi::new(db.clone(), sink.clone(), Coins::from(TEST_FEE), EventProducers::default());
    let payments = PaymentFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
    let users = UserApi::new(db.clone());
    let settings =
        AppSettings { signup_bonus: Coins::from(TEST_SIGNUP_BONUS), referral_reward: Coins::from(20) };
    TestContext {
        db,
        gateway: gateway.clone(),
        sink: sink.clone(),
        users_data: web::Data::new(users),
        pairing_data: web::Data::new(pairing),
        payments_data: web::Data::new(payments),
        sink_data: web::Data::new(sink),
        settings_data: web::Data::new(settings),
    }
}

/// Registers a user directly against the store, skipping the HTTP surface.
pub async fn register_user(ctx: &TestContext, id: i64, gender: Gender) -> UserId {
    let user = NewUser {
        telegram_id: UserId(id),
        name: format!("user-{id}"),
        gender,
        province: "Tehran".to_string(),
        city: "Tehran".to_string(),
        age: 25,
        profile_pic: None,
    };
    let (profile, created) = ctx.users_data.register(user, Coins::from(TEST_SIGNUP_BONUS)).await.unwrap();
    assert!(created);
    profile.telegram_id
}

/// Builds the service under test with the context's app data and the mock types plugged into the
/// real route table.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.users_data.clone())
                .app_data($ctx.pairing_data.clone())
                .app_data($ctx.payments_data.clone())
                .app_data($ctx.sink_data.clone())
                .app_data($ctx.settings_data.clone())
                .configure($crate::routes::configure::<
                    pairline_engine::SqliteDatabase,
                    $crate::endpoint_tests::helpers::ScriptedGateway,
                    $crate::endpoint_tests::helpers::RecordingSink,
                >),
        )
        .await
    };
}

pub(crate) use test_app;
