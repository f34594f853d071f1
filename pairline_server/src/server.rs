use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use pairline_engine::{
    db_types::PaymentStatus,
    events::{EventHandlers, EventHooks, PaymentSettledEvent},
    MessageSink,
    PairingApi,
    PaymentFlowApi,
    SqliteDatabase,
    UserApi,
    ZarinpalGateway,
};
use pls_common::Coins;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::configure,
    sweep_worker::start_sweep_worker,
    transport::TelegramTransport,
    update_handler::AppSettings,
};

const EVENT_BUFFER_SIZE: usize = 25;
const DB_POOL_SIZE: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_POOL_SIZE)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let transport = TelegramTransport::new(config.transport.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        ZarinpalGateway::new(config.zarinpal.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;

    // the settle notification goes straight back out through the transport
    let mut hooks = EventHooks::default();
    let notifier = transport.clone();
    hooks.on_payment_settled(move |event: PaymentSettledEvent| {
        let notifier = notifier.clone();
        Box::pin(async move {
            let request = event.request;
            let text = match request.status {
                PaymentStatus::Success => {
                    format!("✅ Payment confirmed. {} added to your account.", request.coins)
                },
                _ => "❌ Your payment was not completed. No coins were added.".to_string(),
            };
            if let Err(e) = notifier.send_text(request.user_id, &text).await {
                debug!("📨️ Could not notify {} about their payment: {e}", request.user_id);
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let pairing = PairingApi::new(db.clone(), transport.clone(), Coins::from(config.pairing_fee), producers.clone());
    let payments = PaymentFlowApi::new(db.clone(), gateway, producers);
    let users = UserApi::new(db);
    let settings = AppSettings {
        signup_bonus: Coins::from(config.signup_bonus),
        referral_reward: Coins::from(config.referral_reward),
    };

    start_sweep_worker(pairing.clone(), transport.clone(), config.sweep_interval, config.waiting_timeout);

    let srv = create_server_instance(&config, pairing, payments, users, transport, settings)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: &ServerConfig,
    pairing: PairingApi<SqliteDatabase, TelegramTransport>,
    payments: PaymentFlowApi<SqliteDatabase, ZarinpalGateway>,
    users: UserApi<SqliteDatabase>,
    transport: TelegramTransport,
    settings: AppSettings,
) -> Result<Server, ServerError> {
    // the APIs are wrapped once, outside the factory closure: every worker must share the same
    // waiting pool and session registry
    let pairing = web::Data::new(pairing);
    let payments = web::Data::new(payments);
    let users = web::Data::new(users);
    let transport = web::Data::new(transport);
    let settings = web::Data::new(settings);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pls::access_log"))
            .app_data(pairing.clone())
            .app_data(payments.clone())
            .app_data(users.clone())
            .app_data(transport.clone())
            .app_data(settings.clone())
            .configure(configure::<SqliteDatabase, ZarinpalGateway, TelegramTransport>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Server instance created for {}:{}", config.host, config.port);
    Ok(srv)
}
