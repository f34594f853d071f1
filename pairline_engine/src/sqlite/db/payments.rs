use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AuthorityToken, NewPaymentRequest, PaymentRequest, PaymentStatus},
    traits::PaymentLedgerError,
};

pub async fn insert_new(
    request: NewPaymentRequest,
    conn: &mut SqliteConnection,
) -> Result<PaymentRequest, PaymentLedgerError> {
    let authority = request.authority.clone();
    let row = sqlx::query_as::<_, PaymentRequest>(
        r#"
        INSERT INTO payments (user_id, amount, coins, authority) VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, amount, coins, authority, status, created_at, updated_at
        "#,
    )
    .bind(request.user_id)
    .bind(request.amount)
    .bind(request.coins)
    .bind(request.authority)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => PaymentLedgerError::DuplicateAuthority(authority),
        _ => PaymentLedgerError::from(e),
    })?;
    Ok(row)
}

pub async fn fetch_by_authority(
    authority: &AuthorityToken,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRequest>, PaymentLedgerError> {
    let row = sqlx::query_as::<_, PaymentRequest>(
        "SELECT id, user_id, amount, coins, authority, status, created_at, updated_at FROM payments WHERE authority \
         = $1",
    )
    .bind(authority)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// The compare-and-set at the heart of reconciliation: the row only moves to `status` if it is
/// still `Pending`. `None` means some other caller already settled it (or it never existed) and
/// nothing was written.
pub async fn mark_terminal(
    authority: &AuthorityToken,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRequest>, PaymentLedgerError> {
    let row = sqlx::query_as::<_, PaymentRequest>(
        r#"
        UPDATE payments SET status = $1, updated_at = $2
        WHERE authority = $3 AND status = 'Pending'
        RETURNING id, user_id, amount, coins, authority, status, created_at, updated_at
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(authority)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}
