use actix_web::test;
use pairline_engine::{
    db_types::{Gender, UserId},
    UserManagement,
};
use pls_common::Coins;
use serde_json::json;

use crate::endpoint_tests::helpers::{register_user, setup, test_app, TEST_FEE, TEST_SIGNUP_BONUS};

#[actix_web::test]
async fn the_full_match_flow_works_over_http() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let u1 = register_user(&ctx, 1, Gender::Male).await;
    let u2 = register_user(&ctx, 2, Gender::Female).await;

    // u1 starts looking
    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 1, "command": "match", "desired_gender": "Female" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(ctx.sink.last_text_to(u1).unwrap().contains("Looking for a partner"));

    // u2 matches immediately, both sides hear about it and both paid the fee
    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 2, "command": "match", "desired_gender": "Male" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(ctx.sink.last_text_to(u1).unwrap().contains("Partner found"));
    assert!(ctx.sink.last_text_to(u2).unwrap().contains("Partner found"));
    assert_eq!(ctx.db.coin_balance(u1).await.unwrap(), Coins::from(TEST_SIGNUP_BONUS - TEST_FEE));
    assert_eq!(ctx.db.coin_balance(u2).await.unwrap(), Coins::from(TEST_SIGNUP_BONUS - TEST_FEE));

    // a plain text message is relayed to the partner
    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 1, "text": "salam" }))
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(ctx.sink.last_text_to(u2).unwrap(), "salam");

    // ending the chat notifies the other side
    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 2, "command": "end" }))
        .to_request();
    test::call_service(&app, req).await;
    assert!(ctx.sink.last_text_to(u1).unwrap().contains("partner left"));
    assert!(ctx.sink.last_text_to(u2).unwrap().contains("Chat ended"));
}

#[actix_web::test]
async fn unregistered_users_are_sent_to_registration() {
    let ctx = setup().await;
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 7, "command": "match", "desired_gender": "Female" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(ctx.sink.last_text_to(UserId(7)).unwrap().contains("register first"));
}

#[actix_web::test]
async fn registration_over_http_pays_the_signup_bonus_once() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let body = json!({
        "sender_id": 5,
        "command": "register",
        "registration": { "name": "Sara", "gender": "Female", "province": "Tehran", "city": "Tehran", "age": 22 }
    });

    let req = test::TestRequest::post().uri("/bot/update").set_json(&body).to_request();
    test::call_service(&app, req).await;
    assert!(ctx.sink.last_text_to(UserId(5)).unwrap().contains("Registration complete"));
    assert_eq!(ctx.db.coin_balance(UserId(5)).await.unwrap(), Coins::from(TEST_SIGNUP_BONUS));

    let req = test::TestRequest::post().uri("/bot/update").set_json(&body).to_request();
    test::call_service(&app, req).await;
    assert!(ctx.sink.last_text_to(UserId(5)).unwrap().contains("already registered"));
    assert_eq!(ctx.db.coin_balance(UserId(5)).await.unwrap(), Coins::from(TEST_SIGNUP_BONUS));
}

#[actix_web::test]
async fn buying_a_package_hands_back_the_gateway_link() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let buyer = register_user(&ctx, 3, Gender::Male).await;

    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 3, "command": "buy", "package": "coins50" }))
        .to_request();
    test::call_service(&app, req).await;
    let text = ctx.sink.last_text_to(buyer).unwrap();
    assert!(text.contains("https://gateway.test/StartPay/"));
    assert!(text.contains("50 coin(s)"));
}

#[actix_web::test]
async fn an_invite_rewards_the_inviter_on_first_contact() {
    let ctx = setup().await;
    let app = test_app!(ctx);
    let inviter = register_user(&ctx, 10, Gender::Female).await;

    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 11, "command": "start", "referrer": 10 }))
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(ctx.db.coin_balance(inviter).await.unwrap(), Coins::from(TEST_SIGNUP_BONUS + 20));

    // replaying the invite pays nothing more
    let req = test::TestRequest::post()
        .uri("/bot/update")
        .set_json(json!({ "sender_id": 11, "command": "start", "referrer": 10 }))
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(ctx.db.coin_balance(inviter).await.unwrap(), Coins::from(TEST_SIGNUP_BONUS + 20));
}
