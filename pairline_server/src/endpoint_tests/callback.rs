use actix_web::test;
use pairline_engine::{
    db_types::{Gender, PaymentStatus},
    PaymentLedgerDatabase,
    UserManagement,
};
use pls_common::{Coins, Rial};

use crate::{
    data_objects::JsonResponse,
    endpoint_tests::helpers::{register_user, setup, test_app},
};

#[actix_web::test]
async fn the_callback_settles_once_and_stays_idempotent() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let buyer = register_user(&ctx, 1, Gender::Male).await;
    let ticket =
        ctx.payments_data.create_purchase(buyer, Rial::from(25_000), Coins::from(50), "50 coins").await.unwrap();
    let uri = format!("/payment/callback?Authority={}&Status=OK", ticket.request.authority);

    let resp: JsonResponse = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status, "payment completed");
    assert_eq!(ctx.db.coin_balance(buyer).await.unwrap(), Coins::from(15 + 50));

    // the gateway retries the callback; the outcome is repeated and nothing is re-credited
    let resp: JsonResponse = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status, "payment completed");
    assert_eq!(ctx.db.coin_balance(buyer).await.unwrap(), Coins::from(15 + 50));
    assert_eq!(ctx.gateway.verify_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn an_unknown_authority_is_acknowledged_without_side_effects() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let buyer = register_user(&ctx, 1, Gender::Male).await;

    let req = test::TestRequest::get().uri("/payment/callback?Authority=tok-unknown&Status=OK").to_request();
    let resp: JsonResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp.status, "unknown transaction");
    assert_eq!(ctx.db.coin_balance(buyer).await.unwrap(), Coins::from(15));
}

#[actix_web::test]
async fn a_nok_callback_marks_the_row_failed_without_credit() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let buyer = register_user(&ctx, 1, Gender::Female).await;
    let ticket =
        ctx.payments_data.create_purchase(buyer, Rial::from(50_000), Coins::from(120), "120 coins").await.unwrap();
    let uri = format!("/payment/callback?Authority={}&Status=NOK", ticket.request.authority);

    let resp: JsonResponse = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status, "payment failed");

    let row = ctx.db.fetch_payment_request(&ticket.request.authority).await.unwrap().unwrap();
    assert_eq!(row.status, PaymentStatus::Failed);
    assert_eq!(ctx.db.coin_balance(buyer).await.unwrap(), Coins::from(15));
    assert_eq!(ctx.gateway.verify_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
