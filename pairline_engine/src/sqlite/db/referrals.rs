use sqlx::SqliteConnection;

use crate::{db_types::UserId, traits::UserAccountError};

/// Records the invite if this invited user has never been claimed before. Returns whether a row
/// was written; `false` means the invite was already recorded (by this or another inviter).
pub async fn insert_if_absent(
    inviter: UserId,
    invited: UserId,
    conn: &mut SqliteConnection,
) -> Result<bool, UserAccountError> {
    let result = sqlx::query("INSERT INTO referrals (inviter_id, invited_id) VALUES ($1, $2)")
        .bind(inviter)
        .bind(invited)
        .execute(conn)
        .await;
    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
        Err(e) => Err(e.into()),
    }
}
