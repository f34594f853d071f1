//! Registration, referral and ban bookkeeping.
use chrono::{Duration, Utc};
use pairline_engine::{
    db_types::{Gender, NewReport, NewUser, UserId},
    test_utils::prepare_env::{prepare_test_db, random_db_path},
    SqliteDatabase,
    UserAccountError,
    UserApi,
    UserManagement,
};
use pls_common::Coins;

fn new_user(id: i64) -> NewUser {
    NewUser {
        telegram_id: UserId(id),
        name: format!("user-{id}"),
        gender: Gender::Female,
        province: "Isfahan".to_string(),
        city: "Isfahan".to_string(),
        age: 22,
        profile_pic: Some(format!("file-{id}")),
    }
}

async fn setup() -> (SqliteDatabase, UserApi<SqliteDatabase>) {
    let db = prepare_test_db(&random_db_path()).await;
    let api = UserApi::new(db.clone());
    (db, api)
}

#[tokio::test]
async fn the_signup_bonus_is_paid_once() {
    let (_, api) = setup().await;
    let (profile, created) = api.register(new_user(1), Coins::from(15)).await.unwrap();
    assert!(created);
    assert_eq!(profile.coins, Coins::from(15));

    let (profile, created) = api.register(new_user(1), Coins::from(15)).await.unwrap();
    assert!(!created);
    assert_eq!(profile.coins, Coins::from(15));
}

#[tokio::test]
async fn unregistered_users_have_no_balance() {
    let (db, api) = setup().await;
    assert!(api.profile(UserId(99)).await.unwrap().is_none());
    let result = db.coin_balance(UserId(99)).await;
    assert!(matches!(result, Err(UserAccountError::UserNotFound(UserId(99)))));
}

#[tokio::test]
async fn referral_rewards_are_paid_at_most_once_per_invited_user() {
    let (db, api) = setup().await;
    api.register(new_user(1), Coins::from(0)).await.unwrap();
    api.register(new_user(2), Coins::from(0)).await.unwrap();

    assert!(api.handle_referral(UserId(1), UserId(2), Coins::from(20)).await.unwrap());
    assert_eq!(db.coin_balance(UserId(1)).await.unwrap(), Coins::from(20));

    // a replayed invite link pays nothing
    assert!(!api.handle_referral(UserId(1), UserId(2), Coins::from(20)).await.unwrap());
    assert_eq!(db.coin_balance(UserId(1)).await.unwrap(), Coins::from(20));

    // nor can a second inviter claim the same user
    api.register(new_user(3), Coins::from(0)).await.unwrap();
    assert!(!api.handle_referral(UserId(3), UserId(2), Coins::from(20)).await.unwrap());
    assert_eq!(db.coin_balance(UserId(3)).await.unwrap(), Coins::from(0));
}

#[tokio::test]
async fn self_referrals_are_ignored() {
    let (db, api) = setup().await;
    api.register(new_user(1), Coins::from(0)).await.unwrap();
    assert!(!api.handle_referral(UserId(1), UserId(1), Coins::from(20)).await.unwrap());
    assert_eq!(db.coin_balance(UserId(1)).await.unwrap(), Coins::from(0));
}

#[tokio::test]
async fn bans_show_up_on_the_profile() {
    let (_, api) = setup().await;
    api.register(new_user(1), Coins::from(0)).await.unwrap();
    let until = Utc::now() + Duration::hours(24);
    api.ban(UserId(1), until).await.unwrap();

    let profile = api.profile(UserId(1)).await.unwrap().unwrap();
    assert!(profile.is_banned(Utc::now()));
    assert!(!profile.is_banned(until + Duration::seconds(1)));

    api.report(NewReport { reporter_id: UserId(2), reported_id: UserId(1), reason: Some("spam".into()) })
        .await
        .unwrap();
}
