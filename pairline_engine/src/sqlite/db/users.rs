use chrono::{DateTime, Utc};
use log::trace;
use pls_common::Coins;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, UserId, UserProfile},
    traits::UserAccountError,
};

pub async fn user_by_id(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, UserAccountError> {
    trace!("🧑️ Fetching profile for {user_id}");
    let user = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT telegram_id, name, gender, province, city, age, profile_pic, coins, registered_at, banned_until
        FROM users
        WHERE telegram_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

/// Inserts the user with the signup bonus as the starting balance. Returns `None` if a row with
/// this id already exists (in which case nothing was written).
pub async fn insert_if_absent(
    user: NewUser,
    signup_bonus: Coins,
    conn: &mut SqliteConnection,
) -> Result<Option<UserProfile>, UserAccountError> {
    let result = sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO users (telegram_id, name, gender, province, city, age, profile_pic, coins)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING telegram_id, name, gender, province, city, age, profile_pic, coins, registered_at, banned_until
        "#,
    )
    .bind(user.telegram_id)
    .bind(user.name)
    .bind(user.gender)
    .bind(user.province)
    .bind(user.city)
    .bind(user.age)
    .bind(user.profile_pic)
    .bind(signup_bonus)
    .fetch_one(conn)
    .await;
    match result {
        Ok(profile) => Ok(Some(profile)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn coin_balance(user_id: UserId, conn: &mut SqliteConnection) -> Result<Coins, UserAccountError> {
    let balance: Option<Coins> = sqlx::query_scalar("SELECT coins FROM users WHERE telegram_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    balance.ok_or(UserAccountError::UserNotFound(user_id))
}

pub async fn add_coins(user_id: UserId, amount: Coins, conn: &mut SqliteConnection) -> Result<Coins, UserAccountError> {
    let balance: Option<Coins> =
        sqlx::query_scalar("UPDATE users SET coins = coins + $1 WHERE telegram_id = $2 RETURNING coins")
            .bind(amount)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    balance.ok_or(UserAccountError::UserNotFound(user_id))
}

/// Compare-and-decrement. Returns whether the debit was applied; `false` means the balance was
/// short and the row is untouched.
pub async fn try_debit(user_id: UserId, fee: Coins, conn: &mut SqliteConnection) -> Result<bool, UserAccountError> {
    let result = sqlx::query("UPDATE users SET coins = coins - $1 WHERE telegram_id = $2 AND coins >= $1")
        .bind(fee)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_banned_until(
    user_id: UserId,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), UserAccountError> {
    let result = sqlx::query("UPDATE users SET banned_until = $1 WHERE telegram_id = $2")
        .bind(until)
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(UserAccountError::UserNotFound(user_id));
    }
    Ok(())
}
